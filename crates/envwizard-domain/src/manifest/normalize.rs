/// Canonicalizes a distribution name: lowercase, with every run of `-`, `_`,
/// and `.` collapsed to a single `-`.
pub fn canonicalize_package_name(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut in_separator_run = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            in_separator_run = true;
            continue;
        }
        if in_separator_run {
            canonical.push('-');
            in_separator_run = false;
        }
        canonical.extend(ch.to_lowercase());
    }
    if in_separator_run {
        canonical.push('-');
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::canonicalize_package_name;

    #[test]
    fn canonicalize_lowercases_and_folds_separators() {
        assert_eq!(canonicalize_package_name("Flask"), "flask");
        assert_eq!(canonicalize_package_name("psycopg2_binary"), "psycopg2-binary");
        assert_eq!(canonicalize_package_name("zope.interface"), "zope-interface");
        assert_eq!(canonicalize_package_name("ruamel.yaml.clib"), "ruamel-yaml-clib");
    }

    #[test]
    fn canonicalize_collapses_separator_runs() {
        assert_eq!(canonicalize_package_name("a--b__c..d"), "a-b-c-d");
        assert_eq!(canonicalize_package_name("  Django-REST__framework "), "django-rest-framework");
    }
}
