//! Locating and probing Python interpreters.

pub(crate) mod interpreter;
