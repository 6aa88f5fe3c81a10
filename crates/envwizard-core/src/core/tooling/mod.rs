//! Outcome shaping, subprocess execution, and response rendering helpers.

pub(crate) mod outcome;
pub(crate) mod process;
pub(crate) mod report;
