//! Resolved Go types, signatures and function objects.
//!
//! These are the checked counterparts of type expressions: every named type
//! carries the package it was declared in, so a [`Qualifier`] can decide how
//! to print it from the point of view of another file.

use std::path::PathBuf;

/// A package identity: import path plus declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRef {
    pub path: String,
    pub name: String,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// The standard library "testing" package.
    pub fn testing() -> Self {
        Self::new("testing", "testing")
    }

    /// The standard library "context" package.
    pub fn context() -> Self {
        Self::new("context", "context")
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Shape of a named type's underlying type, as far as zero values care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Underlying {
    Struct,
    Array,
    Basic(String),
    /// Pointer, slice, map, channel, function or interface
    Nillable,
    Unknown,
}

/// A defined (named) type, possibly instantiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    pub package: PackageRef,
    pub name: String,
    pub type_args: Vec<Type>,
    pub underlying: Underlying,
}

/// An alias declaration `type A = T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub package: PackageRef,
    pub name: String,
    pub target: Box<Type>,
}

/// A parameter, result or receiver variable. Unnamed variables have an
/// empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub ty: Type,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn unnamed(ty: Type) -> Self {
        Self::new("", ty)
    }
}

/// Function signature. For variadic signatures the last parameter has
/// slice type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Var>,
    pub results: Vec<Var>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// `None` for embedded fields
    pub name: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    Method { name: String, signature: Signature },
    Embedded(Type),
}

/// A resolved Go type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Predeclared basic type such as `int` or `string`
    Basic(String),
    /// The predeclared `error` interface
    Error,
    /// The predeclared `any` alias
    Any,
    Named(Named),
    Alias(Alias),
    TypeParam(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array { len: String, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Func(Box<Signature>),
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceElem>),
    /// A type expression that could not be resolved
    Invalid(String),
}

const BASIC_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "float32", "float64", "complex64", "complex128", "byte",
    "rune",
];

/// Whether `name` is a predeclared basic type.
pub fn is_basic_name(name: &str) -> bool {
    BASIC_TYPES.contains(&name)
}

/// A function or method object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub package: PackageRef,
    pub recv: Option<Var>,
    pub signature: Signature,
    pub file: PathBuf,
    /// Byte offset of the declaration in `file`
    pub decl_start: usize,
}

impl Func {
    pub fn exported(&self) -> bool {
        is_exported(&self.name)
    }

    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

/// Whether an identifier is visible outside its package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Decides the printed prefix for references to a package.
///
/// An empty result prints the reference unqualified.
pub trait Qualifier {
    fn qualify(&mut self, pkg: &PackageRef) -> String;
}

impl<F> Qualifier for F
where
    F: FnMut(&PackageRef) -> String,
{
    fn qualify(&mut self, pkg: &PackageRef) -> String {
        self(pkg)
    }
}

fn qualified(q: &mut dyn Qualifier, pkg: &PackageRef, name: &str) -> String {
    let prefix = q.qualify(pkg);
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Print a type the way Go source would spell it, qualifying package
/// references through `q`.
pub fn type_string(ty: &Type, q: &mut dyn Qualifier) -> String {
    let mut out = String::new();
    write_type(&mut out, ty, q);
    out
}

fn write_type(out: &mut String, ty: &Type, q: &mut dyn Qualifier) {
    match ty {
        Type::Basic(name) => out.push_str(name),
        Type::Error => out.push_str("error"),
        Type::Any => out.push_str("any"),
        Type::Named(named) => {
            out.push_str(&qualified(q, &named.package, &named.name));
            if !named.type_args.is_empty() {
                out.push('[');
                for (i, arg) in named.type_args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_type(out, arg, q);
                }
                out.push(']');
            }
        }
        Type::Alias(alias) => out.push_str(&qualified(q, &alias.package, &alias.name)),
        Type::TypeParam(name) => out.push_str(name),
        Type::Pointer(elem) => {
            out.push('*');
            write_type(out, elem, q);
        }
        Type::Slice(elem) => {
            out.push_str("[]");
            write_type(out, elem, q);
        }
        Type::Array { len, elem } => {
            out.push('[');
            out.push_str(len);
            out.push(']');
            write_type(out, elem, q);
        }
        Type::Map { key, value } => {
            out.push_str("map[");
            write_type(out, key, q);
            out.push(']');
            write_type(out, value, q);
        }
        Type::Chan { dir, elem } => {
            match dir {
                ChanDir::Both => out.push_str("chan "),
                ChanDir::Send => out.push_str("chan<- "),
                ChanDir::Recv => out.push_str("<-chan "),
            }
            // `chan (<-chan T)` needs parentheses to keep its meaning.
            let paren = *dir == ChanDir::Both
                && matches!(elem.as_ref(), Type::Chan { dir: ChanDir::Recv, .. });
            if paren {
                out.push('(');
            }
            write_type(out, elem, q);
            if paren {
                out.push(')');
            }
        }
        Type::Func(sig) => {
            out.push_str("func");
            write_signature(out, sig, q);
        }
        Type::Struct(fields) => {
            out.push_str("struct{");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                if let Some(name) = &field.name {
                    out.push_str(name);
                    out.push(' ');
                }
                write_type(out, &field.ty, q);
            }
            out.push('}');
        }
        Type::Interface(elems) => {
            out.push_str("interface{");
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                match elem {
                    InterfaceElem::Method { name, signature } => {
                        out.push_str(name);
                        write_signature(out, signature, q);
                    }
                    InterfaceElem::Embedded(ty) => write_type(out, ty, q),
                }
            }
            out.push('}');
        }
        Type::Invalid(_) => out.push_str("invalid type"),
    }
}

fn write_signature(out: &mut String, sig: &Signature, q: &mut dyn Qualifier) {
    out.push('(');
    let last = sig.params.len().saturating_sub(1);
    for (i, param) in sig.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if !param.name.is_empty() {
            out.push_str(&param.name);
            out.push(' ');
        }
        match (&param.ty, sig.variadic && i == last) {
            (Type::Slice(elem), true) => {
                out.push_str("...");
                write_type(out, elem, q);
            }
            (ty, _) => write_type(out, ty, q),
        }
    }
    out.push(')');

    match sig.results.as_slice() {
        [] => {}
        [single] if single.name.is_empty() => {
            out.push(' ');
            write_type(out, &single.ty, q);
        }
        results => {
            out.push_str(" (");
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if !result.name.is_empty() {
                    out.push_str(&result.name);
                    out.push(' ');
                }
                write_type(out, &result.ty, q);
            }
            out.push(')');
        }
    }
}

enum ZeroKind {
    Literal(&'static str),
    Composite,
    NewOf,
}

fn basic_zero(name: &str) -> ZeroKind {
    match name {
        "bool" => ZeroKind::Literal("false"),
        "string" => ZeroKind::Literal("\"\""),
        n if is_basic_name(n) => ZeroKind::Literal("0"),
        _ => ZeroKind::NewOf,
    }
}

fn zero_kind(ty: &Type) -> ZeroKind {
    match ty {
        Type::Basic(name) => basic_zero(name),
        Type::Error
        | Type::Any
        | Type::Pointer(_)
        | Type::Slice(_)
        | Type::Map { .. }
        | Type::Chan { .. }
        | Type::Func(_)
        | Type::Interface(_) => ZeroKind::Literal("nil"),
        Type::Array { .. } | Type::Struct(_) => ZeroKind::Composite,
        Type::Named(named) => match &named.underlying {
            Underlying::Struct | Underlying::Array => ZeroKind::Composite,
            Underlying::Basic(name) => basic_zero(name),
            Underlying::Nillable => ZeroKind::Literal("nil"),
            Underlying::Unknown => ZeroKind::NewOf,
        },
        Type::Alias(alias) => zero_kind(&alias.target),
        Type::TypeParam(_) | Type::Invalid(_) => ZeroKind::NewOf,
    }
}

/// An expression for the zero value of `ty`.
pub fn zero_string(ty: &Type, q: &mut dyn Qualifier) -> String {
    match zero_kind(ty) {
        ZeroKind::Literal(lit) => lit.to_string(),
        ZeroKind::Composite => format!("{}{{}}", type_string(ty, q)),
        ZeroKind::NewOf => format!("*new({})", type_string(ty, q)),
    }
}

/// Follow alias declarations to the aliased type.
pub fn unalias(mut ty: &Type) -> &Type {
    while let Type::Alias(alias) = ty {
        ty = &alias.target;
    }
    ty
}

/// The named type of a receiver-like type: `T`, `*T`, or aliases of them.
pub fn receiver_named(ty: &Type) -> Option<&Named> {
    let ty = match unalias(ty) {
        Type::Pointer(elem) => unalias(elem),
        other => other,
    };
    match ty {
        Type::Named(named) => Some(named),
        _ => None,
    }
}

/// Whether `ty` is `context.Context`.
pub fn is_context_type(ty: &Type) -> bool {
    matches!(ty, Type::Named(n) if n.package.path == "context" && n.name == "Context")
}

/// Whether `ty` is the predeclared `error` type.
pub fn is_error_type(ty: &Type) -> bool {
    matches!(unalias(ty), Type::Error)
}

fn canonical_basic(name: &str) -> &str {
    match name {
        "byte" => "uint8",
        "rune" => "int32",
        other => other,
    }
}

/// Type identity.
pub fn identical(a: &Type, b: &Type) -> bool {
    let (a, b) = (unalias(a), unalias(b));
    match (a, b) {
        (Type::Basic(x), Type::Basic(y)) => canonical_basic(x) == canonical_basic(y),
        (Type::Error, Type::Error) => true,
        (Type::Any, Type::Any) => true,
        (Type::Any, Type::Interface(e)) | (Type::Interface(e), Type::Any) => e.is_empty(),
        (Type::Named(x), Type::Named(y)) => {
            x.package.path == y.package.path
                && x.name == y.name
                && x.type_args.len() == y.type_args.len()
                && x.type_args.iter().zip(&y.type_args).all(|(p, q)| identical(p, q))
        }
        (Type::TypeParam(x), Type::TypeParam(y)) => x == y,
        (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => identical(x, y),
        (Type::Array { len: l1, elem: e1 }, Type::Array { len: l2, elem: e2 }) => {
            l1 == l2 && identical(e1, e2)
        }
        (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
            identical(k1, k2) && identical(v1, v2)
        }
        (Type::Chan { dir: d1, elem: e1 }, Type::Chan { dir: d2, elem: e2 }) => {
            d1 == d2 && identical(e1, e2)
        }
        (Type::Func(s1), Type::Func(s2)) => identical_signatures(s1, s2),
        (Type::Struct(f1), Type::Struct(f2)) => {
            f1.len() == f2.len()
                && f1
                    .iter()
                    .zip(f2)
                    .all(|(x, y)| x.name == y.name && identical(&x.ty, &y.ty))
        }
        (Type::Interface(e1), Type::Interface(e2)) => {
            e1.len() == e2.len()
                && e1.iter().zip(e2).all(|(x, y)| match (x, y) {
                    (
                        InterfaceElem::Method { name: n1, signature: s1 },
                        InterfaceElem::Method { name: n2, signature: s2 },
                    ) => n1 == n2 && identical_signatures(s1, s2),
                    (InterfaceElem::Embedded(t1), InterfaceElem::Embedded(t2)) => identical(t1, t2),
                    _ => false,
                })
        }
        _ => false,
    }
}

fn identical_signatures(a: &Signature, b: &Signature) -> bool {
    a.variadic == b.variadic
        && a.params.len() == b.params.len()
        && a.results.len() == b.results.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| identical(&x.ty, &y.ty))
        && a.results.iter().zip(&b.results).all(|(x, y)| identical(&x.ty, &y.ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(path: &str, pkg: &str, name: &str, underlying: Underlying) -> Type {
        Type::Named(Named {
            package: PackageRef::new(path, pkg),
            name: name.to_string(),
            type_args: vec![],
            underlying,
        })
    }

    fn always(prefix: &'static str) -> impl FnMut(&PackageRef) -> String {
        move |_: &PackageRef| prefix.to_string()
    }

    #[test]
    fn test_type_string_composites() {
        let user = named("example.com/app", "app", "User", Underlying::Struct);
        let ty = Type::Map {
            key: Box::new(Type::Basic("string".into())),
            value: Box::new(Type::Slice(Box::new(Type::Pointer(Box::new(user))))),
        };
        assert_eq!(type_string(&ty, &mut always("app")), "map[string][]*app.User");
        assert_eq!(type_string(&ty, &mut always("")), "map[string][]*User");
    }

    #[test]
    fn test_type_string_func_and_chan() {
        let sig = Signature {
            params: vec![
                Var::new("n", Type::Basic("int".into())),
                Var::new("rest", Type::Slice(Box::new(Type::Basic("string".into())))),
            ],
            results: vec![Var::unnamed(Type::Error)],
            variadic: true,
        };
        assert_eq!(
            type_string(&Type::Func(Box::new(sig)), &mut always("")),
            "func(n int, rest ...string) error"
        );

        let ch = Type::Chan {
            dir: ChanDir::Both,
            elem: Box::new(Type::Chan {
                dir: ChanDir::Recv,
                elem: Box::new(Type::Basic("int".into())),
            }),
        };
        assert_eq!(type_string(&ch, &mut always("")), "chan (<-chan int)");
    }

    #[test]
    fn test_zero_strings() {
        let mut q = always("p");
        assert_eq!(zero_string(&Type::Basic("int64".into()), &mut q), "0");
        assert_eq!(zero_string(&Type::Basic("string".into()), &mut q), "\"\"");
        assert_eq!(zero_string(&Type::Basic("bool".into()), &mut q), "false");
        assert_eq!(zero_string(&Type::Error, &mut q), "nil");
        assert_eq!(
            zero_string(&named("x/p", "p", "Point", Underlying::Struct), &mut q),
            "p.Point{}"
        );
        assert_eq!(
            zero_string(&named("x/p", "p", "Level", Underlying::Basic("int".into())), &mut q),
            "0"
        );
        assert_eq!(
            zero_string(&named("x/p", "p", "Opaque", Underlying::Unknown), &mut q),
            "*new(p.Opaque)"
        );
        assert_eq!(zero_string(&Type::TypeParam("T".into()), &mut q), "*new(T)");
        let arr = Type::Array {
            len: "4".into(),
            elem: Box::new(Type::Basic("byte".into())),
        };
        assert_eq!(zero_string(&arr, &mut q), "[4]byte{}");
    }

    #[test]
    fn test_receiver_named_through_alias_and_pointer() {
        let set = named("x/s", "s", "set", Underlying::Struct);
        let alias = Type::Alias(Alias {
            package: PackageRef::new("x/s", "s"),
            name: "Set".into(),
            target: Box::new(set.clone()),
        });
        let ptr = Type::Pointer(Box::new(alias));
        assert_eq!(receiver_named(&ptr).map(|n| n.name.as_str()), Some("set"));
        assert!(identical(&ptr, &Type::Pointer(Box::new(set))));
        assert!(receiver_named(&Type::Basic("int".into())).is_none());
    }

    #[test]
    fn test_identical_basics() {
        assert!(identical(&Type::Basic("byte".into()), &Type::Basic("uint8".into())));
        assert!(!identical(&Type::Basic("int".into()), &Type::Basic("int64".into())));
        assert!(identical(&Type::Any, &Type::Interface(vec![])));
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Add"));
        assert!(!is_exported("add"));
        assert!(!is_exported("_Add"));
        assert!(!is_exported(""));
    }
}
