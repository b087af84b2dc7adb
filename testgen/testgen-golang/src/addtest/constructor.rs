//! Constructor discovery for method receivers.

use crate::types::{identical, is_error_type, receiver_named, Func, Named, Type};

fn has_type_params(named: &Named) -> bool {
    named.type_args.iter().any(|arg| matches!(arg, Type::TypeParam(_)))
}

/// Whether `f` can construct a value of the named type `want`.
///
/// It must be a plain function returning `T`, `*T`, `(T, error)` or
/// `(*T, error)`, and visible to the test package.
pub fn is_constructor_for(f: &Func, want: &Named, xtest: bool) -> bool {
    if f.is_method() || (xtest && !f.exported()) {
        return false;
    }
    let results = &f.signature.results;
    if results.is_empty() || results.len() > 2 {
        return false;
    }
    let Some(got) = receiver_named(&results[0].ty) else {
        return false;
    };
    // Type parameters of different declarations are never identical.
    if has_type_params(got) || has_type_params(want) {
        return false;
    }
    if !identical(&Type::Named(got.clone()), &Type::Named(want.clone())) {
        return false;
    }
    results.len() == 1 || is_error_type(&results[1].ty)
}

/// Pick the constructor for a receiver type.
///
/// Candidates are scanned in name order. The first match is kept unless a
/// later one is named `New<type_name>`, compared case-insensitively.
pub fn find_constructor<'a>(
    candidates: &[&'a Func],
    want: &Named,
    type_name: &str,
    xtest: bool,
) -> Option<&'a Func> {
    let mut sorted: Vec<&'a Func> = candidates.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let canonical = format!("new{}", type_name);
    let mut selected: Option<&'a Func> = None;
    for f in sorted {
        if !is_constructor_for(f, want, xtest) {
            continue;
        }
        if selected.is_none() || f.name.eq_ignore_ascii_case(&canonical) {
            selected = Some(f);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackageRef, Signature, Underlying, Var};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn pkg() -> PackageRef {
        PackageRef::new("example.com/set", "set")
    }

    fn named(name: &str) -> Named {
        Named {
            package: pkg(),
            name: name.into(),
            type_args: Vec::new(),
            underlying: Underlying::Struct,
        }
    }

    fn func(name: &str, results: Vec<Type>) -> Func {
        Func {
            name: name.into(),
            package: pkg(),
            recv: None,
            signature: Signature {
                params: Vec::new(),
                results: results.into_iter().map(Var::unnamed).collect(),
                variadic: false,
            },
            file: PathBuf::from("set.go"),
            decl_start: 0,
        }
    }

    fn ptr(name: &str) -> Type {
        Type::Pointer(Box::new(Type::Named(named(name))))
    }

    #[test]
    fn test_prefers_canonical_name() {
        let funcs = vec![
            func("Empty", vec![ptr("Set")]),
            func("NewSet", vec![ptr("Set")]),
            func("Other", vec![ptr("Bag")]),
        ];
        let refs: Vec<&Func> = funcs.iter().collect();
        let chosen = find_constructor(&refs, &named("Set"), "Set", true).unwrap();
        assert_eq!(chosen.name, "NewSet");
    }

    #[test]
    fn test_first_match_without_canonical() {
        let funcs = vec![
            func("Zeta", vec![Type::Named(named("Set"))]),
            func("Make", vec![ptr("Set"), Type::Error]),
        ];
        let refs: Vec<&Func> = funcs.iter().collect();
        let chosen = find_constructor(&refs, &named("Set"), "Set", true).unwrap();
        assert_eq!(chosen.name, "Make");
    }

    #[test]
    fn test_filters() {
        let funcs = vec![
            func("NewSet", vec![ptr("Set"), Type::Basic("int".into())]),
            func("newSet", vec![ptr("Set")]),
            func("Build", vec![]),
            func("Many", vec![ptr("Set"), Type::Error, Type::Error]),
        ];
        let refs: Vec<&Func> = funcs.iter().collect();
        assert!(find_constructor(&refs, &named("Set"), "Set", true).is_none());
        let chosen = find_constructor(&refs, &named("Set"), "Set", false).unwrap();
        assert_eq!(chosen.name, "newSet");
    }

    #[test]
    fn test_generic_types_never_match() {
        let mut generic = named("Set");
        generic.type_args = vec![Type::TypeParam("T".into())];
        let funcs = vec![func("NewSet", vec![Type::Pointer(Box::new(Type::Named(generic.clone())))])];
        let refs: Vec<&Func> = funcs.iter().collect();
        assert!(find_constructor(&refs, &generic, "Set", false).is_none());
    }

    proptest! {
        #[test]
        fn prop_discovery_is_order_independent(
            names in proptest::collection::btree_set("[A-Za-z]{1,7}", 1..8),
            canonical_at in 0usize..8,
        ) {
            let mut funcs: Vec<Func> = names.iter().map(|n| func(n, vec![ptr("Set")])).collect();
            let has_canonical = canonical_at < funcs.len()
                && !names.iter().any(|n| n.eq_ignore_ascii_case("newset"));
            if has_canonical {
                funcs[canonical_at].name = "NewSet".to_string();
            }
            let forward: Vec<&Func> = funcs.iter().collect();
            let backward: Vec<&Func> = funcs.iter().rev().collect();
            let a = find_constructor(&forward, &named("Set"), "Set", false).map(|f| f.name.clone());
            let b = find_constructor(&backward, &named("Set"), "Set", false).map(|f| f.name.clone());
            prop_assert_eq!(a.clone(), b);
            if has_canonical {
                prop_assert_eq!(a, Some("NewSet".to_string()));
            }
        }
    }
}
