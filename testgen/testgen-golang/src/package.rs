//! Type-checked package view.
//!
//! [`Package::check`] takes the parsed files of one package and resolves
//! every type expression appearing in type declarations and in function and
//! method signatures. Bodies are not checked. Names that cannot be resolved
//! and redeclared identifiers are recorded as type errors, which is enough
//! for callers that refuse to work on ill-typed packages.

use crate::imports::import_path_to_assumed_name;
use crate::protocol::Position;
use crate::syntax::ParsedGoFile;
use crate::types::{
    is_basic_name, Alias, ChanDir, Func, InterfaceElem, Named, PackageRef, Signature, StructField,
    Type, Underlying, Var,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::Node;

/// Package ID used for files that do not belong to any module.
pub const COMMAND_LINE_ARGUMENTS: &str = "command-line-arguments";

/// Whether a package ID denotes the synthetic command-line package.
pub fn is_command_line_arguments(id: &str) -> bool {
    id == COMMAND_LINE_ARGUMENTS || id.ends_with(&format!("/{}", COMMAND_LINE_ARGUMENTS))
}

/// Package identity and its dependency graph edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub id: String,
    pub path: String,
    pub name: String,
    /// Import path -> declared package name, for resolved imports
    pub deps_by_import_path: BTreeMap<String, String>,
}

impl PackageMetadata {
    pub fn is_command_line_arguments(&self) -> bool {
        is_command_line_arguments(&self.id)
    }

    pub fn package_ref(&self) -> PackageRef {
        PackageRef::new(self.path.clone(), self.name.clone())
    }
}

/// A parse or type error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub position: Position,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file.display(),
            self.position.line + 1,
            self.position.column + 1,
            self.message
        )
    }
}

/// A checked package.
#[derive(Debug)]
pub struct Package {
    metadata: PackageMetadata,
    files: Vec<ParsedGoFile>,
    funcs: Vec<Func>,
    defs: HashMap<(PathBuf, usize), usize>,
    parse_errors: Vec<Diagnostic>,
    type_errors: Vec<Diagnostic>,
}

impl Package {
    /// Check the given files as one package.
    pub fn check(metadata: PackageMetadata, files: Vec<ParsedGoFile>) -> Self {
        let parse_errors: Vec<Diagnostic> = files
            .iter()
            .flat_map(|f| {
                f.parse_errors().iter().map(|e| Diagnostic {
                    file: f.path().to_path_buf(),
                    position: e.position,
                    message: e.message.clone(),
                })
            })
            .collect();

        let (funcs, type_errors) = {
            let mut checker = Checker::new(&metadata, &files);
            checker.run();
            (checker.funcs, checker.errors)
        };

        let defs = funcs
            .iter()
            .enumerate()
            .map(|(i, f)| ((f.file.clone(), f.decl_start), i))
            .collect();

        debug!(
            package = %metadata.path,
            files = files.len(),
            funcs = funcs.len(),
            parse_errors = parse_errors.len(),
            type_errors = type_errors.len(),
            "Checked package"
        );

        Self {
            metadata,
            files,
            funcs,
            defs,
            parse_errors,
            type_errors,
        }
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn package_ref(&self) -> PackageRef {
        self.metadata.package_ref()
    }

    pub fn files(&self) -> &[ParsedGoFile] {
        &self.files
    }

    pub fn file(&self, path: &Path) -> Option<&ParsedGoFile> {
        self.files.iter().find(|f| f.path() == path)
    }

    pub fn parse_errors(&self) -> &[Diagnostic] {
        &self.parse_errors
    }

    pub fn type_errors(&self) -> &[Diagnostic] {
        &self.type_errors
    }

    /// The function object declared at `decl_start` in `path`.
    pub fn func_at(&self, path: &Path, decl_start: usize) -> Option<&Func> {
        self.defs
            .get(&(path.to_path_buf(), decl_start))
            .map(|&i| &self.funcs[i])
    }

    /// Package-level functions (not methods), ordered by name.
    pub fn scope_funcs(&self) -> Vec<&Func> {
        let mut funcs: Vec<&Func> = self.funcs.iter().filter(|f| !f.is_method()).collect();
        funcs.sort_by(|a, b| a.name.cmp(&b.name));
        funcs
    }

    /// Declared name of an imported package, when known.
    pub fn dep_name(&self, import_path: &str) -> Option<&str> {
        self.metadata
            .deps_by_import_path
            .get(import_path)
            .map(String::as_str)
    }
}

/// Underlying shape of commonly used standard library types.
fn well_known_underlying(path: &str, name: &str) -> Underlying {
    match (path, name) {
        ("time", "Time")
        | ("sync", "Mutex")
        | ("sync", "RWMutex")
        | ("sync", "WaitGroup")
        | ("sync", "Once")
        | ("strings", "Builder")
        | ("strings", "Reader")
        | ("bytes", "Buffer")
        | ("net/http", "Request")
        | ("net/http", "Client")
        | ("net/url", "URL") => Underlying::Struct,
        ("time", "Duration") => Underlying::Basic("int64".into()),
        ("time", "Month") | ("time", "Weekday") => Underlying::Basic("int".into()),
        ("os", "FileMode") | ("io/fs", "FileMode") => Underlying::Basic("uint32".into()),
        ("context", "Context")
        | ("context", "CancelFunc")
        | ("io", "Reader")
        | ("io", "Writer")
        | ("io", "ReadCloser")
        | ("io", "ReadWriter")
        | ("io", "WriteCloser")
        | ("fmt", "Stringer")
        | ("net/http", "Handler")
        | ("net/http", "HandlerFunc")
        | ("net/http", "ResponseWriter")
        | ("net/http", "Header") => Underlying::Nillable,
        _ => Underlying::Unknown,
    }
}

#[derive(Clone, Copy)]
struct TypeDeclSite<'a> {
    file: usize,
    node: Node<'a>,
    rhs: Node<'a>,
    alias: bool,
}

struct Checker<'a> {
    pkg: PackageRef,
    files: &'a [ParsedGoFile],
    scopes: Vec<FileScope>,
    decls: BTreeMap<String, TypeDeclSite<'a>>,
    underlying: HashMap<String, Underlying>,
    alias_targets: HashMap<String, Option<Type>>,
    funcs: Vec<Func>,
    errors: Vec<Diagnostic>,
}

#[derive(Default)]
struct FileScope {
    imports: HashMap<String, PackageRef>,
    dot_imports: Vec<PackageRef>,
}

impl<'a> Checker<'a> {
    fn new(metadata: &'a PackageMetadata, files: &'a [ParsedGoFile]) -> Self {
        let scopes = files
            .iter()
            .map(|file| {
                let mut scope = FileScope::default();
                for spec in file.imports() {
                    let name = metadata
                        .deps_by_import_path
                        .get(&spec.path)
                        .cloned()
                        .unwrap_or_else(|| import_path_to_assumed_name(&spec.path));
                    let pkg = PackageRef::new(spec.path.clone(), name.clone());
                    match spec.name.as_deref() {
                        Some("_") => {}
                        Some(".") => scope.dot_imports.push(pkg),
                        Some(local) => {
                            scope.imports.insert(local.to_string(), pkg);
                        }
                        None => {
                            scope.imports.insert(name, pkg);
                        }
                    }
                }
                scope
            })
            .collect();

        Self {
            pkg: metadata.package_ref(),
            files,
            scopes,
            decls: BTreeMap::new(),
            underlying: HashMap::new(),
            alias_targets: HashMap::new(),
            funcs: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, file: usize, node: Node<'_>, message: String) {
        let f = &self.files[file];
        self.errors.push(Diagnostic {
            file: f.path().to_path_buf(),
            position: f.lines().position(node.start_byte()),
            message,
        });
    }

    fn text(&self, file: usize, node: Node<'_>) -> &'a str {
        let files = self.files;
        files[file].text(node)
    }

    fn run(&mut self) {
        self.collect_type_decls();
        self.compute_underlying();
        self.collect_funcs();
    }

    fn collect_type_decls(&mut self) {
        let files = self.files;
        for (idx, file) in files.iter().enumerate() {
            let root = file.root();
            let mut cursor = root.walk();
            let decls: Vec<Node<'a>> = root
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "type_declaration")
                .collect();
            for decl in decls {
                let mut inner = decl.walk();
                let specs: Vec<Node<'a>> = decl.named_children(&mut inner).collect();
                for spec in specs {
                    let alias = match spec.kind() {
                        "type_spec" => false,
                        "type_alias" => true,
                        _ => continue,
                    };
                    let (Some(name), Some(rhs)) =
                        (spec.child_by_field_name("name"), spec.child_by_field_name("type"))
                    else {
                        continue;
                    };
                    let name_text = file.text(name).to_string();
                    if name_text == "_" {
                        continue;
                    }
                    if self.decls.contains_key(&name_text) {
                        self.error(idx, name, format!("{} redeclared in this block", name_text));
                        continue;
                    }
                    self.decls.insert(
                        name_text,
                        TypeDeclSite {
                            file: idx,
                            node: spec,
                            rhs,
                            alias,
                        },
                    );
                }
            }
        }
    }

    fn decl_type_params(&self, site: &TypeDeclSite<'a>) -> Vec<String> {
        site.node
            .child_by_field_name("type_parameters")
            .map(|list| self.type_param_names(site.file, list))
            .unwrap_or_default()
    }

    fn type_param_names(&self, file: usize, list: Node<'a>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            if decl.kind() != "type_parameter_declaration" {
                continue;
            }
            let mut inner = decl.walk();
            for name in decl.children_by_field_name("name", &mut inner) {
                names.push(self.text(file, name).to_string());
            }
        }
        names
    }

    fn compute_underlying(&mut self) {
        let sites: Vec<(String, TypeDeclSite<'a>)> =
            self.decls.iter().map(|(k, v)| (k.clone(), *v)).collect();

        let mut rhs_types: HashMap<String, Type> = HashMap::new();
        for (name, site) in &sites {
            let ty = if site.alias {
                self.alias_target(name)
            } else {
                let tparams = self.decl_type_params(site);
                Some(self.resolve_type(site.file, site.rhs, &tparams))
            };
            if let Some(ty) = ty {
                rhs_types.insert(name.clone(), ty);
            }
        }

        for (name, _) in &sites {
            let mut visiting = HashSet::new();
            let underlying = self.classify_decl(name, &rhs_types, &mut visiting);
            self.underlying.insert(name.clone(), underlying);
        }
    }

    fn classify_decl(
        &self,
        name: &str,
        rhs_types: &HashMap<String, Type>,
        visiting: &mut HashSet<String>,
    ) -> Underlying {
        if !visiting.insert(name.to_string()) {
            return Underlying::Unknown;
        }
        match rhs_types.get(name) {
            Some(ty) => self.classify(ty, rhs_types, visiting),
            None => Underlying::Unknown,
        }
    }

    fn classify(
        &self,
        ty: &Type,
        rhs_types: &HashMap<String, Type>,
        visiting: &mut HashSet<String>,
    ) -> Underlying {
        match ty {
            Type::Basic(name) => Underlying::Basic(name.clone()),
            Type::Struct(_) => Underlying::Struct,
            Type::Array { .. } => Underlying::Array,
            Type::Error
            | Type::Any
            | Type::Pointer(_)
            | Type::Slice(_)
            | Type::Map { .. }
            | Type::Chan { .. }
            | Type::Func(_)
            | Type::Interface(_) => Underlying::Nillable,
            Type::Named(named) if named.package.path == self.pkg.path => {
                self.classify_decl(&named.name, rhs_types, visiting)
            }
            Type::Named(named) => named.underlying.clone(),
            Type::Alias(alias) => self.classify(&alias.target, rhs_types, visiting),
            Type::TypeParam(_) | Type::Invalid(_) => Underlying::Unknown,
        }
    }

    /// Resolve the right-hand side of an alias declaration, once.
    fn alias_target(&mut self, name: &str) -> Option<Type> {
        if let Some(done) = self.alias_targets.get(name) {
            return done.clone();
        }
        let site = *self.decls.get(name)?;
        // Mark in progress so alias cycles terminate.
        self.alias_targets.insert(name.to_string(), None);
        let tparams = self.decl_type_params(&site);
        let ty = self.resolve_type(site.file, site.rhs, &tparams);
        self.alias_targets.insert(name.to_string(), Some(ty.clone()));
        Some(ty)
    }

    fn resolve_ident(&mut self, file: usize, node: Node<'a>, tparams: &[String]) -> Type {
        let name = self.text(file, node);
        if tparams.iter().any(|p| p == name) {
            return Type::TypeParam(name.to_string());
        }
        if let Some(site) = self.decls.get(name).copied() {
            if site.alias {
                return match self.alias_target(name) {
                    Some(target) => Type::Alias(Alias {
                        package: self.pkg.clone(),
                        name: name.to_string(),
                        target: Box::new(target),
                    }),
                    None => {
                        self.error(file, node, format!("invalid recursive type alias {}", name));
                        Type::Invalid(name.to_string())
                    }
                };
            }
            return Type::Named(Named {
                package: self.pkg.clone(),
                name: name.to_string(),
                type_args: Vec::new(),
                underlying: self
                    .underlying
                    .get(name)
                    .cloned()
                    .unwrap_or(Underlying::Unknown),
            });
        }
        match name {
            "error" => return Type::Error,
            "any" => return Type::Any,
            n if is_basic_name(n) => return Type::Basic(n.to_string()),
            _ => {}
        }
        let dots = &self.scopes[file].dot_imports;
        match dots.as_slice() {
            [] => {
                self.error(file, node, format!("undefined: {}", name));
                Type::Invalid(name.to_string())
            }
            [only] => Type::Named(Named {
                package: only.clone(),
                name: name.to_string(),
                type_args: Vec::new(),
                underlying: well_known_underlying(&only.path, name),
            }),
            // Ambiguous without the imported packages' scopes.
            _ => Type::Invalid(name.to_string()),
        }
    }

    fn resolve_qualified(&mut self, file: usize, node: Node<'a>) -> Type {
        let (Some(pkg), Some(name)) = (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) else {
            return Type::Invalid(self.text(file, node).to_string());
        };
        let pkg_name = self.text(file, pkg);
        let name = self.text(file, name);
        match self.scopes[file].imports.get(pkg_name).cloned() {
            Some(package) => Type::Named(Named {
                underlying: well_known_underlying(&package.path, name),
                package,
                name: name.to_string(),
                type_args: Vec::new(),
            }),
            None => {
                self.error(file, pkg, format!("undefined: {}", pkg_name));
                Type::Invalid(format!("{}.{}", pkg_name, name))
            }
        }
    }

    fn resolve_type(&mut self, file: usize, node: Node<'a>, tparams: &[String]) -> Type {
        match node.kind() {
            "type_identifier" => self.resolve_ident(file, node, tparams),
            "qualified_type" => self.resolve_qualified(file, node),
            "generic_type" => {
                let base = match node.child_by_field_name("type") {
                    Some(base) => self.resolve_type(file, base, tparams),
                    None => return Type::Invalid(self.text(file, node).to_string()),
                };
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|list| self.resolve_type_args(file, list, tparams))
                    .unwrap_or_default();
                match base {
                    Type::Named(mut named) => {
                        named.type_args = args;
                        Type::Named(named)
                    }
                    other => other,
                }
            }
            "pointer_type" => match node.named_child(0) {
                Some(elem) => Type::Pointer(Box::new(self.resolve_type(file, elem, tparams))),
                None => Type::Invalid(self.text(file, node).to_string()),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => Type::Slice(Box::new(self.resolve_type(file, elem, tparams))),
                None => Type::Invalid(self.text(file, node).to_string()),
            },
            "array_type" => {
                let len = node
                    .child_by_field_name("length")
                    .map(|n| self.text(file, n).to_string())
                    .unwrap_or_default();
                match node.child_by_field_name("element") {
                    Some(elem) => Type::Array {
                        len,
                        elem: Box::new(self.resolve_type(file, elem, tparams)),
                    },
                    None => Type::Invalid(self.text(file, node).to_string()),
                }
            }
            "map_type" => {
                let (Some(key), Some(value)) =
                    (node.child_by_field_name("key"), node.child_by_field_name("value"))
                else {
                    return Type::Invalid(self.text(file, node).to_string());
                };
                Type::Map {
                    key: Box::new(self.resolve_type(file, key, tparams)),
                    value: Box::new(self.resolve_type(file, value, tparams)),
                }
            }
            "channel_type" => {
                let Some(value) = node.child_by_field_name("value") else {
                    return Type::Invalid(self.text(file, node).to_string());
                };
                Type::Chan {
                    dir: channel_dir(node),
                    elem: Box::new(self.resolve_type(file, value, tparams)),
                }
            }
            "function_type" => {
                Type::Func(Box::new(self.resolve_signature(file, node, tparams)))
            }
            "struct_type" => Type::Struct(self.resolve_struct_fields(file, node, tparams)),
            "interface_type" => Type::Interface(self.resolve_interface(file, node, tparams)),
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.resolve_type(file, inner, tparams),
                None => Type::Invalid(self.text(file, node).to_string()),
            },
            // Constraint-only syntax never appears in checked positions.
            "negated_type" | "union_type" => Type::Invalid(self.text(file, node).to_string()),
            other => {
                self.error(file, node, format!("unsupported type expression {}", other));
                Type::Invalid(self.text(file, node).to_string())
            }
        }
    }

    fn resolve_type_args(&mut self, file: usize, list: Node<'a>, tparams: &[String]) -> Vec<Type> {
        let mut cursor = list.walk();
        let nodes: Vec<Node<'a>> = list.named_children(&mut cursor).collect();
        nodes
            .into_iter()
            .filter(|n| n.kind() != "comment")
            .filter_map(|n| {
                if n.kind() == "type_elem" {
                    n.named_child(0)
                } else {
                    Some(n)
                }
            })
            .map(|n| self.resolve_type(file, n, tparams))
            .collect()
    }

    fn resolve_struct_fields(
        &mut self,
        file: usize,
        node: Node<'a>,
        tparams: &[String],
    ) -> Vec<StructField> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        let lists: Vec<Node<'a>> = node
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "field_declaration_list")
            .collect();
        for list in lists {
            let mut inner = list.walk();
            let decls: Vec<Node<'a>> = list
                .named_children(&mut inner)
                .filter(|n| n.kind() == "field_declaration")
                .collect();
            for decl in decls {
                let Some(ty_node) = decl.child_by_field_name("type") else {
                    continue;
                };
                let ty = self.resolve_type(file, ty_node, tparams);
                let mut names_cursor = decl.walk();
                let names: Vec<String> = decl
                    .children_by_field_name("name", &mut names_cursor)
                    .map(|n| self.text(file, n).to_string())
                    .collect();
                if names.is_empty() {
                    let embedded = if decl.child(0).is_some_and(|c| c.kind() == "*") {
                        Type::Pointer(Box::new(ty))
                    } else {
                        ty
                    };
                    fields.push(StructField {
                        name: None,
                        ty: embedded,
                    });
                } else {
                    for name in names {
                        fields.push(StructField {
                            name: Some(name),
                            ty: ty.clone(),
                        });
                    }
                }
            }
        }
        fields
    }

    fn resolve_interface(
        &mut self,
        file: usize,
        node: Node<'a>,
        tparams: &[String],
    ) -> Vec<InterfaceElem> {
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        let mut elems = Vec::new();
        for child in children {
            match child.kind() {
                "method_elem" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let name = self.text(file, name).to_string();
                    let signature = self.resolve_signature(file, child, tparams);
                    elems.push(InterfaceElem::Method { name, signature });
                }
                "type_elem" => {
                    if child.named_child_count() == 1 {
                        if let Some(inner) = child.named_child(0) {
                            let ty = self.resolve_type(file, inner, tparams);
                            elems.push(InterfaceElem::Embedded(ty));
                        }
                    }
                }
                _ => {}
            }
        }
        elems
    }

    /// Resolve the `parameters` and `result` fields of a function-like node.
    fn resolve_signature(&mut self, file: usize, node: Node<'a>, tparams: &[String]) -> Signature {
        let (params, variadic) = match node.child_by_field_name("parameters") {
            Some(list) => self.resolve_params(file, list, tparams),
            None => (Vec::new(), false),
        };
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => {
                self.resolve_params(file, result, tparams).0
            }
            Some(result) => vec![Var::unnamed(self.resolve_type(file, result, tparams))],
            None => Vec::new(),
        };
        Signature {
            params,
            results,
            variadic,
        }
    }

    fn resolve_params(&mut self, file: usize, list: Node<'a>, tparams: &[String]) -> (Vec<Var>, bool) {
        let mut vars = Vec::new();
        let mut variadic = false;
        let mut cursor = list.walk();
        let decls: Vec<Node<'a>> = list.named_children(&mut cursor).collect();
        for decl in decls {
            match decl.kind() {
                "parameter_declaration" => {
                    let Some(ty_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let ty = self.resolve_type(file, ty_node, tparams);
                    let mut names_cursor = decl.walk();
                    let names: Vec<String> = decl
                        .children_by_field_name("name", &mut names_cursor)
                        .map(|n| self.text(file, n).to_string())
                        .collect();
                    if names.is_empty() {
                        vars.push(Var::unnamed(ty));
                    } else {
                        vars.extend(names.into_iter().map(|n| Var::new(n, ty.clone())));
                    }
                }
                "variadic_parameter_declaration" => {
                    let Some(ty_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let elem = self.resolve_type(file, ty_node, tparams);
                    let name = decl
                        .child_by_field_name("name")
                        .map(|n| self.text(file, n).to_string())
                        .unwrap_or_default();
                    vars.push(Var::new(name, Type::Slice(Box::new(elem))));
                    variadic = true;
                }
                _ => {}
            }
        }
        (vars, variadic)
    }

    fn collect_funcs(&mut self) {
        let files = self.files;
        let mut seen_funcs: HashSet<String> = HashSet::new();
        let mut seen_methods: HashSet<(String, String)> = HashSet::new();

        for (idx, file) in files.iter().enumerate() {
            let root = file.root();
            let mut cursor = root.walk();
            let decls: Vec<Node<'a>> = root
                .named_children(&mut cursor)
                .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
                .collect();

            for decl in decls {
                let Some(name_node) = decl.child_by_field_name("name") else {
                    continue;
                };
                let name = file.text(name_node).to_string();

                let func = if decl.kind() == "function_declaration" {
                    if name != "init" && name != "_" {
                        if !seen_funcs.insert(name.clone()) || self.decls.contains_key(&name) {
                            self.error(idx, name_node, format!("{} redeclared in this block", name));
                        }
                    }
                    let tparams = decl
                        .child_by_field_name("type_parameters")
                        .map(|list| self.type_param_names(idx, list))
                        .unwrap_or_default();
                    Func {
                        name,
                        package: self.pkg.clone(),
                        recv: None,
                        signature: self.resolve_signature(idx, decl, &tparams),
                        file: file.path().to_path_buf(),
                        decl_start: decl.start_byte(),
                    }
                } else {
                    let Some((recv, base)) = self.resolve_receiver(idx, decl) else {
                        continue;
                    };
                    if !seen_methods.insert((base.clone(), name.clone())) {
                        self.error(
                            idx,
                            name_node,
                            format!("method {}.{} already declared", base, name),
                        );
                    }
                    let tparams = receiver_type_params(&recv.ty);
                    Func {
                        name,
                        package: self.pkg.clone(),
                        recv: Some(recv),
                        signature: self.resolve_signature(idx, decl, &tparams),
                        file: file.path().to_path_buf(),
                        decl_start: decl.start_byte(),
                    }
                };
                self.funcs.push(func);
            }
        }
    }

    /// Resolve a method receiver, returning it with its base type name.
    fn resolve_receiver(&mut self, file: usize, decl: Node<'a>) -> Option<(Var, String)> {
        let list = decl.child_by_field_name("receiver")?;
        let mut cursor = list.walk();
        let param = list
            .named_children(&mut cursor)
            .find(|n| n.kind() == "parameter_declaration")?;
        let ty_node = param.child_by_field_name("type")?;
        let name = param
            .child_by_field_name("name")
            .map(|n| self.text(file, n).to_string())
            .unwrap_or_default();

        let mut base = ty_node;
        while matches!(base.kind(), "pointer_type" | "parenthesized_type") {
            base = base.named_child(0)?;
        }
        let (ident, tparams) = match base.kind() {
            "type_identifier" => (base, Vec::new()),
            "generic_type" => {
                let ident = base.child_by_field_name("type")?;
                let params = base
                    .child_by_field_name("type_arguments")
                    .map(|args| {
                        let mut c = args.walk();
                        let nodes: Vec<Node<'a>> = args.named_children(&mut c).collect();
                        nodes
                            .into_iter()
                            .filter_map(|n| {
                                if n.kind() == "type_elem" {
                                    n.named_child(0)
                                } else {
                                    Some(n)
                                }
                            })
                            .map(|n| self.text(file, n).to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                (ident, params)
            }
            _ => {
                self.error(file, ty_node, "invalid receiver type".to_string());
                return None;
            }
        };

        let base_name = self.text(file, ident).to_string();
        if !self.decls.contains_key(&base_name) {
            self.error(
                file,
                ident,
                format!("cannot define new methods on non-local type {}", base_name),
            );
            return None;
        }
        let ty = self.resolve_type(file, ty_node, &tparams);
        Some((Var::new(name, ty), base_name))
    }
}

fn receiver_type_params(ty: &Type) -> Vec<String> {
    let named = match ty {
        Type::Pointer(elem) => elem.as_ref(),
        other => other,
    };
    match named {
        Type::Named(n) => n
            .type_args
            .iter()
            .filter_map(|a| match a {
                Type::TypeParam(p) => Some(p.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn channel_dir(node: Node<'_>) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| c.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", "chan", ..] => ChanDir::Recv,
        ["chan", "<-", ..] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}
