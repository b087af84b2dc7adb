//! Go syntax layer built on tree-sitter-go.
//!
//! A [`ParsedGoFile`] owns the source text and its syntax tree and exposes the
//! pieces of file structure the scaffold generator needs: the package clause,
//! the import specs, the leading comment groups and the top-level
//! declaration enclosing a byte range.

use crate::protocol::{LineIndex, Position};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tree_sitter::{Language, Node, Parser, Tree};

static GO_LANGUAGE: Lazy<Language> = Lazy::new(|| tree_sitter_go::LANGUAGE.into());

/// Tree-sitter parser configured for Go.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new Go parser.
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&GO_LANGUAGE)
            .context("Failed to set Go parser language")?;
        Ok(Self { parser })
    }

    /// Parse a Go source file.
    pub fn parse(&mut self, path: impl Into<PathBuf>, src: impl Into<String>) -> Result<ParsedGoFile> {
        let path = path.into();
        let src = src.into();
        let tree = self
            .parser
            .parse(&src, None)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(ParsedGoFile::new(path, src, tree))
    }
}

/// Parse a single file with a fresh parser.
pub fn parse_file(path: impl Into<PathBuf>, src: impl Into<String>) -> Result<ParsedGoFile> {
    GoParser::new()?.parse(path, src)
}

/// One `import` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name: an identifier, `_` or `.`
    pub name: Option<String>,
    /// Unquoted import path
    pub path: String,
    pub start: usize,
    pub end: usize,
}

impl ImportSpec {
    pub fn is_dot(&self) -> bool {
        self.name.as_deref() == Some(".")
    }

    pub fn is_blank(&self) -> bool {
        self.name.as_deref() == Some("_")
    }
}

/// A syntax error reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub position: Position,
    pub message: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.position.line + 1,
            self.position.column + 1,
            self.message
        )
    }
}

/// A run of adjacent comments with no blank line between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub start: usize,
    pub end: usize,
    pub start_row: usize,
    pub end_row: usize,
    /// Text of the first comment in the group
    pub first: String,
}

/// Package clause location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageClause {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub row: usize,
}

/// A parsed Go file.
pub struct ParsedGoFile {
    path: PathBuf,
    src: String,
    tree: Tree,
    lines: LineIndex,
    package: Option<PackageClause>,
    imports: Vec<ImportSpec>,
    errors: Vec<SyntaxError>,
}

impl std::fmt::Debug for ParsedGoFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedGoFile")
            .field("path", &self.path)
            .field("package", &self.package)
            .field("imports", &self.imports)
            .field("errors", &self.errors)
            .finish()
    }
}

impl ParsedGoFile {
    fn new(path: PathBuf, src: String, tree: Tree) -> Self {
        let lines = LineIndex::new(&src);
        let (package, imports, errors) = {
            let root = tree.root_node();
            let mut package = None;
            let mut imports = Vec::new();
            let mut cursor = root.walk();
            for child in root.named_children(&mut cursor) {
                match child.kind() {
                    "package_clause" if package.is_none() => {
                        package = package_clause(child, &src);
                    }
                    "import_declaration" => collect_import_specs(child, &src, &mut imports),
                    _ => {}
                }
            }

            let errors = if root.has_error() {
                collect_syntax_errors(root, &src, &lines)
            } else {
                Vec::new()
            };
            (package, imports, errors)
        };

        Self {
            path,
            src,
            tree,
            lines,
            package,
            imports,
            errors,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Text covered by a node of this file's tree.
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.src[node.byte_range()]
    }

    pub fn package(&self) -> Option<&PackageClause> {
        self.package.as_ref()
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    pub fn parse_errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn end_offset(&self) -> usize {
        self.src.len()
    }

    /// Comment groups that appear before the first non-comment top-level node.
    pub fn leading_comment_groups(&self) -> Vec<CommentGroup> {
        let root = self.root();
        let mut groups: Vec<CommentGroup> = Vec::new();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() != "comment" {
                break;
            }
            let (row, end_row) = (child.start_position().row, child.end_position().row);
            match groups.last_mut() {
                Some(group) if row <= group.end_row + 1 => {
                    group.end = child.end_byte();
                    group.end_row = end_row;
                }
                _ => groups.push(CommentGroup {
                    start: child.start_byte(),
                    end: child.end_byte(),
                    start_row: row,
                    end_row,
                    first: self.text(child).to_string(),
                }),
            }
        }
        groups
    }

    /// The file's copyright header, if its first comment group is one.
    ///
    /// The group must precede the package clause, must not be the package
    /// doc comment, must not start with a directive and must mention
    /// "copyright".
    pub fn copyright_header(&self) -> Option<&str> {
        let package = self.package.as_ref()?;
        let group = self.leading_comment_groups().into_iter().next()?;
        if group.start >= package.start {
            return None;
        }
        let is_doc = group.end_row + 1 >= package.row;
        if is_doc || is_directive(&group.first) {
            return None;
        }
        if !group.first.to_lowercase().contains("copyright") {
            return None;
        }
        Some(&self.src[group.start..group.end])
    }

    /// The top-level function or method declaration enclosing `start..end`.
    pub fn enclosing_func_decl(&self, start: usize, end: usize) -> Option<Node<'_>> {
        let root = self.root();
        let mut node = root.descendant_for_byte_range(start, end)?;
        loop {
            let parent = node.parent()?;
            if parent.id() == root.id() {
                break;
            }
            node = parent;
        }
        matches!(node.kind(), "function_declaration" | "method_declaration").then_some(node)
    }

    /// Names of all top-level functions (not methods) declared in this file.
    pub fn top_level_func_names(&self) -> Vec<String> {
        let root = self.root();
        let mut cursor = root.walk();
        let names = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "function_declaration")
            .filter_map(|n| n.child_by_field_name("name"))
            .map(|n| self.text(n).to_string())
            .collect();
        names
    }
}

fn package_clause(node: Node<'_>, src: &str) -> Option<PackageClause> {
    let mut cursor = node.walk();
    let ident = node
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_identifier")?;
    if ident.is_missing() || ident.byte_range().is_empty() {
        return None;
    }
    Some(PackageClause {
        name: src[ident.byte_range()].to_string(),
        start: node.start_byte(),
        end: node.end_byte(),
        row: node.start_position().row,
    })
}

fn collect_import_specs(decl: Node<'_>, src: &str, out: &mut Vec<ImportSpec>) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => out.extend(import_spec(child, src)),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        out.extend(import_spec(spec, src));
                    }
                }
            }
            _ => {}
        }
    }
}

fn import_spec(node: Node<'_>, src: &str) -> Option<ImportSpec> {
    let path = node.child_by_field_name("path")?;
    let name = node
        .child_by_field_name("name")
        .map(|n| src[n.byte_range()].to_string());
    Some(ImportSpec {
        name,
        path: unquote(&src[path.byte_range()]),
        start: node.start_byte(),
        end: node.end_byte(),
    })
}

/// Unquote a Go string literal.
pub fn unquote(lit: &str) -> String {
    if let Some(raw) = lit.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return raw.to_string();
    }
    serde_json::from_str::<String>(lit)
        .unwrap_or_else(|_| lit.trim_matches('"').to_string())
}

/// Whether a comment is a compiler directive such as `//go:build` or
/// `//line file.go:10`.
pub fn is_directive(comment: &str) -> bool {
    let Some(body) = comment.strip_prefix("//") else {
        return false;
    };
    if body.is_empty() {
        return false;
    }
    if body.starts_with("line ") {
        return true;
    }
    let bytes = body.as_bytes();
    let Some(colon) = body.find(':') else {
        return false;
    };
    if colon == 0 || colon + 1 >= bytes.len() {
        return false;
    }
    (0..=colon + 1)
        .filter(|&i| i != colon)
        .all(|i| bytes[i].is_ascii_lowercase() || bytes[i].is_ascii_digit())
}

fn collect_syntax_errors(root: Node<'_>, src: &str, lines: &LineIndex) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            errors.push(SyntaxError {
                offset: node.start_byte(),
                position: lines.position(node.start_byte()),
                message: format!("missing {}", node.kind()),
            });
            continue;
        }
        if node.is_error() {
            let snippet: String = src[node.byte_range()].chars().take(20).collect();
            errors.push(SyntaxError {
                offset: node.start_byte(),
                position: lines.position(node.start_byte()),
                message: format!("unexpected {:?}", snippet),
            });
            continue;
        }
        if node.has_error() {
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
    }
    errors.sort_by_key(|e| e.offset);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_and_imports() {
        let src = r#"package foo

import "fmt"

import (
	str "strings"
	_ "embed"
	. "math"
)
"#;
        let file = parse_file("foo.go", src).unwrap();
        assert_eq!(file.package_name(), Some("foo"));
        let imports = file.imports();
        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].path, "fmt");
        assert_eq!(imports[0].name, None);
        assert_eq!(imports[1].name.as_deref(), Some("str"));
        assert!(imports[2].is_blank());
        assert!(imports[3].is_dot());
        assert!(file.parse_errors().is_empty());
    }

    #[test]
    fn test_parse_errors_are_collected() {
        let file = parse_file("bad.go", "package foo\n\nfunc F( {\n").unwrap();
        assert!(!file.parse_errors().is_empty());
    }

    #[test]
    fn test_copyright_header() {
        let src = "// Copyright 2024 Example Authors.\n// All rights reserved.\n\n// Package foo does things.\npackage foo\n";
        let file = parse_file("foo.go", src).unwrap();
        assert_eq!(
            file.copyright_header(),
            Some("// Copyright 2024 Example Authors.\n// All rights reserved.")
        );
    }

    #[test]
    fn test_doc_comment_is_not_header() {
        let src = "// Copyright notice that is also the doc comment.\npackage foo\n";
        let file = parse_file("foo.go", src).unwrap();
        assert_eq!(file.copyright_header(), None);
    }

    #[test]
    fn test_directive_is_not_header() {
        let src = "//go:build linux copyright\n\npackage foo\n";
        let file = parse_file("foo.go", src).unwrap();
        assert_eq!(file.copyright_header(), None);
    }

    #[test]
    fn test_is_directive() {
        assert!(is_directive("//go:generate stringer"));
        assert!(is_directive("//line foo.go:10"));
        assert!(is_directive("//export:x"));
        assert!(!is_directive("// go:generate"));
        assert!(!is_directive("/* go:build */"));
        assert!(!is_directive("//Copyright: me"));
    }

    #[test]
    fn test_enclosing_func_decl() {
        let src = "package foo\n\nvar x = 1\n\nfunc F() {\n\tg := func() {}\n\t_ = g\n}\n";
        let file = parse_file("foo.go", src).unwrap();
        let inner = src.find("func() {}").unwrap() + 2;
        let decl = file.enclosing_func_decl(inner, inner).unwrap();
        assert_eq!(decl.kind(), "function_declaration");

        let var = src.find("var x").unwrap() + 4;
        assert!(file.enclosing_func_decl(var, var).is_none());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"fmt\""), "fmt");
        assert_eq!(unquote("`net/http`"), "net/http");
    }
}
