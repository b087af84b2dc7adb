//! Local variable naming for generated tests.

use std::collections::HashSet;

/// Names the generated harness binds itself: the `*testing.T` parameter
/// and the loop variable over test cases.
pub const RESERVED_NAMES: [&str; 2] = ["t", "tt"];

/// Prefixes tried, in order, on constructor parameter names.
pub const CONSTRUCTOR_PREFIXES: [&str; 5] = ["", "c", "c_", "i", "i_"];

/// Fallback receiver variable name.
pub const DEFAULT_RECEIVER_NAME: &str = "r";

fn first_char(s: &str) -> &str {
    s.char_indices()
        .nth(1)
        .map(|(i, _)| &s[..i])
        .unwrap_or(s)
}

fn first_two_chars(s: &str) -> &str {
    s.char_indices()
        .nth(2)
        .map(|(i, _)| &s[..i])
        .unwrap_or(s)
}

/// Name for the local variable holding the receiver.
///
/// Candidates, in order: the declared receiver name, its first character,
/// the first character of the type name, the first two characters of the
/// type name and the type name's capitalized initials. The first candidate
/// that is non-empty once lower-cased and not reserved wins.
pub fn receiver_var_name(recv_name: &str, type_name: &str) -> String {
    let mut candidates: Vec<String> = Vec::new();
    if !recv_name.is_empty() {
        candidates.push(recv_name.to_string());
        candidates.push(first_char(recv_name).to_string());
    }
    candidates.push(first_char(type_name).to_string());
    if type_name.chars().count() >= 2 {
        candidates.push(first_two_chars(type_name).to_string());
    }
    let initials: String = type_name
        .chars()
        .enumerate()
        .filter(|(i, c)| *i == 0 || c.is_uppercase())
        .map(|(_, c)| c)
        .collect();
    candidates.push(initials);

    candidates
        .into_iter()
        .map(|c| c.to_lowercase())
        .find(|c| !c.is_empty() && c != "_" && !RESERVED_NAMES.contains(&c.as_str()))
        .unwrap_or_else(|| DEFAULT_RECEIVER_NAME.to_string())
}

/// Prefix that makes every constructor parameter name distinct from the
/// target function's parameter names.
///
/// Tries [`CONSTRUCTOR_PREFIXES`] first. If all of them collide, continues
/// with `c2`, `c3` and so on, so the result is always collision-free.
pub fn collision_free_prefix(taken: &[&str], names: &[&str]) -> String {
    let taken: HashSet<&str> = taken.iter().copied().filter(|n| !n.is_empty()).collect();
    let names: Vec<&str> = names.iter().copied().filter(|n| !n.is_empty()).collect();
    let clear = |prefix: &str| {
        names
            .iter()
            .all(|n| !taken.contains(format!("{}{}", prefix, n).as_str()))
    };

    if let Some(prefix) = CONSTRUCTOR_PREFIXES.iter().copied().find(|p| clear(*p)) {
        return prefix.to_string();
    }
    (2..)
        .map(|n| format!("c{}", n))
        .find(|p| clear(p.as_str()))
        .unwrap_or_default()
}

/// A test function name not present in `existing`, suffixing `_2`, `_3`
/// and so on when needed.
pub fn unique_test_name(base: &str, existing: &[String]) -> String {
    if !existing.iter().any(|e| e == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !existing.iter().any(|e| e == candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_receiver_name_ladder() {
        assert_eq!(receiver_var_name("s", "Set"), "s");
        assert_eq!(receiver_var_name("Srv", "Server"), "srv");
        assert_eq!(receiver_var_name("", "Set"), "s");
        // "t" and "tt" are reserved at every step.
        assert_eq!(receiver_var_name("t", "Tree"), "tr");
        assert_eq!(receiver_var_name("tt", "T"), "r");
        assert_eq!(receiver_var_name("_", "Tt"), "r");
    }

    #[test]
    fn test_initials_candidate() {
        // "t", "tt" are reserved, so the initials "tt" are too; falls back.
        assert_eq!(receiver_var_name("", "TTable"), "r");
        assert_eq!(receiver_var_name("", "T"), "r");
    }

    #[test]
    fn test_prefix_ladder() {
        assert_eq!(collision_free_prefix(&["x"], &["size"]), "");
        assert_eq!(collision_free_prefix(&["size"], &["size"]), "c");
        assert_eq!(collision_free_prefix(&["size", "csize"], &["size"]), "c_");
        assert_eq!(
            collision_free_prefix(&["size", "csize", "c_size", "isize", "i_size"], &["size"]),
            "c2"
        );
        assert_eq!(collision_free_prefix(&["a"], &["", "a"]), "c");
    }

    #[test]
    fn test_unique_test_name() {
        let existing = vec!["TestAdd".to_string(), "TestAdd_2".to_string()];
        assert_eq!(unique_test_name("TestSub", &existing), "TestSub");
        assert_eq!(unique_test_name("TestAdd", &existing), "TestAdd_3");
    }

    proptest! {
        #[test]
        fn prop_prefix_is_collision_free(
            taken in proptest::collection::vec("[a-z_]{1,4}", 0..12),
            names in proptest::collection::vec("[a-z]{1,3}", 0..6),
        ) {
            let taken_refs: Vec<&str> = taken.iter().map(String::as_str).collect();
            let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let prefix = collision_free_prefix(&taken_refs, &name_refs);
            for name in &names {
                let renamed = format!("{}{}", prefix, name);
                prop_assert!(!taken.contains(&renamed));
            }
            // Applying the same resolution twice gives the same prefix.
            prop_assert_eq!(prefix.clone(), collision_free_prefix(&taken_refs, &name_refs));
        }

        #[test]
        fn prop_receiver_name_is_usable(recv in "[A-Za-z_]{0,4}", ty in "[A-Z][A-Za-z]{0,6}") {
            let name = receiver_var_name(&recv, &ty);
            prop_assert!(!name.is_empty());
            prop_assert!(!RESERVED_NAMES.contains(&name.as_str()));
            prop_assert_eq!(name.to_lowercase(), name.clone());
        }
    }
}
