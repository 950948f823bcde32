#[cfg(test)]
mod tests {
    use crate::naming::{derive_resource_name, sanitize_resource_name};

    fn is_valid_name(name: &str) -> bool {
        let allowed = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
        let alnum_ends = match (name.chars().next(), name.chars().last()) {
            (Some(first), Some(last)) => first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric(),
            _ => true,
        };
        allowed && alnum_ends
    }

    #[test]
    fn test_derive_resource_name_replaces_and_lowercases() {
        assert_eq!(derive_resource_name("My Lock!!", "Group A"), "my-lock---group-a");
    }

    #[test]
    fn test_derive_resource_name_plain_inputs() {
        assert_eq!(derive_resource_name("leaders", "orders"), "leaders-orders");
        assert_eq!(derive_resource_name("leaders", "v1.2"), "leaders-v1.2");
    }

    #[test]
    fn test_derive_resource_name_strips_both_ends() {
        assert_eq!(derive_resource_name("--Leaders", "..x.."), "leaders-..x");
        assert_eq!(derive_resource_name("_lock", "grp_"), "lock-grp");
    }

    #[test]
    fn test_derive_resource_name_all_invalid_is_empty() {
        assert_eq!(derive_resource_name("", ""), "");
        assert_eq!(derive_resource_name("!!", "??"), "");
    }

    #[test]
    fn test_derive_resource_name_non_ascii() {
        assert_eq!(derive_resource_name("Ünïcode", "grp"), "n-code-grp");
    }

    #[test]
    fn test_derived_names_are_valid_and_idempotent() {
        let samples = [
            ("My Lock!!", "Group A"),
            ("leaders", "orders"),
            ("--Leaders", "..x.."),
            ("Ünïcode", "grp"),
            ("A.B", "C D E"),
            ("", "x"),
            ("9lives", "-"),
        ];

        for (prefix, group) in samples {
            let name = derive_resource_name(prefix, group);
            assert!(is_valid_name(&name), "invalid name {:?} for {:?}/{:?}", name, prefix, group);
            assert_eq!(sanitize_resource_name(&name), name);
        }
    }
}
