//! Target resolution: which function the test is for, and whether a test
//! for it can be generated at all.

use crate::package::Package;
use crate::syntax::ParsedGoFile;
use crate::types::{is_exported, Func, Type};
use testgen_core::{Result, TestgenError};
use tracing::debug;

/// Reject packages that cannot be analyzed reliably.
pub fn check_package(pkg: &Package) -> Result<()> {
    if pkg.metadata().is_command_line_arguments() {
        return Err(TestgenError::invalid_target(
            "current file in command-line-arguments package",
        ));
    }
    if let Some(first) = pkg.parse_errors().first() {
        return Err(TestgenError::invalid_target(format!(
            "package has parse errors: {}",
            first
        )));
    }
    if let Some(first) = pkg.type_errors().first() {
        return Err(TestgenError::invalid_target(format!(
            "package has type errors: {}",
            first
        )));
    }
    Ok(())
}

/// The function or method declared around the byte range `start..end`.
pub fn enclosing_func<'p>(
    pkg: &'p Package,
    file: &ParsedGoFile,
    start: usize,
    end: usize,
) -> Result<&'p Func> {
    let decl = file
        .enclosing_func_decl(start, end)
        .ok_or(TestgenError::NoEnclosingFunction)?;
    let func = pkg.func_at(file.path(), decl.start_byte()).ok_or_else(|| {
        TestgenError::resolution(format!(
            "no type information for declaration at {}:{}",
            file.path().display(),
            decl.start_position().row + 1
        ))
    })?;
    debug!(func = %func.name, method = func.is_method(), "Resolved target");
    Ok(func)
}

/// Receiver type with one level of pointer removed, aliases preserved.
pub fn receiver_base(func: &Func) -> Option<&Type> {
    let recv = func.recv.as_ref()?;
    Some(match &recv.ty {
        Type::Pointer(elem) => elem.as_ref(),
        other => other,
    })
}

/// Declared name of a named or alias type.
pub fn declared_name(ty: &Type) -> Option<&str> {
    match ty {
        Type::Named(named) => Some(&named.name),
        Type::Alias(alias) => Some(&alias.name),
        _ => None,
    }
}

/// Receiver type name of a method.
pub fn receiver_type_name(func: &Func) -> Result<&str> {
    receiver_base(func).and_then(declared_name).ok_or_else(|| {
        TestgenError::resolution(format!(
            "the receiver type of {} is neither named type nor alias type",
            func.name
        ))
    })
}

/// External test packages can only reach exported functions on exported
/// receiver types.
pub fn check_visibility(func: &Func, package_name: &str) -> Result<()> {
    if !func.exported() {
        return Err(TestgenError::unexported(format!(
            "cannot add test of unexported function {} to external test package {}_test",
            func.name, package_name
        )));
    }
    if func.is_method() {
        let recv = receiver_type_name(func)?;
        if !is_exported(recv) {
            return Err(TestgenError::unexported(format!(
                "cannot add external test for method {}.{} as receiver type is not exported",
                recv, func.name
            )));
        }
    }
    Ok(())
}

/// Name of the test function for `func`.
///
/// `TestF` for exported functions and `Test_f` for unexported ones. Methods
/// include the receiver type: `TestT_M`, or `Test_t_M` when the type is
/// unexported.
pub fn test_name(func: &Func) -> Result<String> {
    let mut name = String::from("Test");
    if func.is_method() {
        let recv = receiver_type_name(func)?;
        if !is_exported(recv) {
            name.push('_');
        }
        name.push_str(recv);
        name.push('_');
    } else if !func.exported() {
        name.push('_');
    }
    name.push_str(&func.name);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageMetadata;
    use crate::syntax::parse_file;
    use std::path::Path;

    fn check(src: &str) -> Package {
        let metadata = PackageMetadata {
            id: "example.com/shop".into(),
            path: "example.com/shop".into(),
            name: "shop".into(),
            ..Default::default()
        };
        Package::check(metadata, vec![parse_file("shop.go", src).unwrap()])
    }

    const SHOP: &str = "package shop

type Cart struct{}

type cart = Cart

type basket struct{}

func (c *Cart) Total() int { return 0 }

func (b basket) size() int { return 0 }

func (c cart) Items() []string { return nil }

func helper() {}

func Checkout(c *Cart) error { return nil }
";

    fn func_named<'p>(pkg: &'p Package, name: &str) -> &'p Func {
        let file = pkg.file(Path::new("shop.go")).unwrap();
        let offset = file.src().find(&format!("{}(", name)).unwrap();
        enclosing_func(pkg, file, offset, offset).unwrap()
    }

    #[test]
    fn test_names() {
        let pkg = check(SHOP);
        assert_eq!(test_name(func_named(&pkg, "Total")).unwrap(), "TestCart_Total");
        assert_eq!(test_name(func_named(&pkg, "size")).unwrap(), "Test_basket_size");
        assert_eq!(test_name(func_named(&pkg, "Items")).unwrap(), "Test_cart_Items");
        assert_eq!(test_name(func_named(&pkg, "helper")).unwrap(), "Test_helper");
        assert_eq!(test_name(func_named(&pkg, "Checkout")).unwrap(), "TestCheckout");
    }

    #[test]
    fn test_visibility() {
        let pkg = check(SHOP);
        assert!(check_visibility(func_named(&pkg, "Total"), "shop").is_ok());
        let err = check_visibility(func_named(&pkg, "helper"), "shop").unwrap_err();
        assert!(err.to_string().contains("shop_test"));
        let err = check_visibility(func_named(&pkg, "Items"), "shop").unwrap_err();
        assert_eq!(err.kind(), testgen_core::ErrorKind::UnexportedTarget);
    }

    #[test]
    fn test_outside_function() {
        let pkg = check(SHOP);
        let file = pkg.file(Path::new("shop.go")).unwrap();
        let offset = file.src().find("type basket").unwrap();
        let err = enclosing_func(&pkg, file, offset, offset).unwrap_err();
        assert_eq!(err.kind(), testgen_core::ErrorKind::NoEnclosingFunction);
    }

    #[test]
    fn test_rejects_broken_package() {
        let pkg = check("package shop\n\nfunc F() Missing { return nil }\n");
        let err = check_package(&pkg).unwrap_err();
        assert!(err.to_string().contains("type errors"));

        let pkg = check("package shop\n\nfunc F( {\n");
        let err = check_package(&pkg).unwrap_err();
        assert!(err.to_string().contains("parse errors"));
    }
}
