//! Import naming, grouping and import-list edits.

use crate::protocol::TextEdit;
use crate::syntax::parse_file;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tree_sitter::Node;

static MAJOR_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^v[0-9]+$").unwrap());

/// Best guess of the package name declared at `import_path`.
///
/// Uses the last path element, skipping a trailing major-version element
/// (`example.com/foo/v2`), dropping a `go-` prefix and truncating at the
/// first character that cannot appear in an identifier.
pub fn import_path_to_assumed_name(import_path: &str) -> String {
    let mut elems = import_path.rsplit('/');
    let mut base = elems.next().unwrap_or(import_path);
    if MAJOR_VERSION.is_match(base) {
        if let Some(parent) = elems.next() {
            base = parent;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(base.len());
    base[..end].to_string()
}

/// An import to be added to a file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImportFix {
    pub path: String,
    /// Explicit local name, only for renamed imports
    pub name: Option<String>,
}

impl ImportFix {
    pub fn new(path: impl Into<String>, name: Option<String>) -> Self {
        Self {
            path: path.into(),
            name,
        }
    }

    /// The spec as it appears inside an import declaration.
    pub fn spec(&self) -> String {
        match &self.name {
            Some(name) => format!("{} \"{}\"", name, self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}

/// Import group rank: standard library, third party, then local packages.
pub fn import_group(path: &str, local_prefix: Option<&str>) -> u8 {
    let is_local = local_prefix
        .map(|prefixes| {
            prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .any(|p| path.starts_with(p))
        })
        .unwrap_or(false);
    if is_local {
        return 2;
    }
    let first = path.split('/').next().unwrap_or(path);
    if first.contains('.') { 1 } else { 0 }
}

/// Format an import declaration for a file that has none.
///
/// A single import is written on one line. Several imports are sorted and
/// grouped, with a blank line between groups. The result starts with a
/// blank line and ends with a newline.
pub fn format_import_block(fixes: &[ImportFix], local_prefix: Option<&str>) -> String {
    match fixes {
        [] => String::new(),
        [only] => format!("\nimport {}\n", only.spec()),
        _ => {
            let mut groups: BTreeMap<u8, Vec<&ImportFix>> = BTreeMap::new();
            for fix in fixes {
                groups
                    .entry(import_group(&fix.path, local_prefix))
                    .or_default()
                    .push(fix);
            }
            let mut out = String::from("\nimport (\n");
            for (i, group) in groups.values_mut().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                group.sort();
                for fix in group.iter() {
                    out.push('\t');
                    out.push_str(&fix.spec());
                    out.push('\n');
                }
            }
            out.push_str(")\n");
            out
        }
    }
}

struct ExistingSpec {
    path: String,
    group: u8,
    line_start: usize,
    line_end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Placement {
    Within,
    GroupBefore,
    GroupAfter,
}

/// Edits that add `fixes` to the import list of the Go file `src`.
///
/// Imports already present are skipped and unrelated imports are left in
/// place. New specs go into the last parenthesized import declaration,
/// next to specs of the same group. A lone unparenthesized declaration is
/// rewritten as a grouped block; a file without imports gets a new
/// declaration after its package clause.
pub fn compute_import_fix_edits(
    local_prefix: Option<&str>,
    src: &str,
    fixes: &[ImportFix],
) -> Result<Vec<TextEdit>> {
    let file = parse_file("imports.go", src)?;
    let mut fixes: Vec<&ImportFix> = fixes
        .iter()
        .filter(|fix| {
            !file
                .imports()
                .iter()
                .any(|spec| spec.path == fix.path && spec.name == fix.name)
        })
        .collect();
    fixes.sort();
    fixes.dedup();
    if fixes.is_empty() {
        return Ok(Vec::new());
    }

    let root = file.root();
    let mut cursor = root.walk();
    let decls: Vec<Node<'_>> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "import_declaration")
        .collect();

    let block = decls.iter().rev().find_map(|decl| {
        let mut c = decl.walk();
        let list = decl
            .named_children(&mut c)
            .find(|n| n.kind() == "import_spec_list");
        list
    });

    if let Some(list) = block {
        return Ok(block_edits(src, list, &fixes, local_prefix));
    }

    // A lone unparenthesized import becomes a block holding it and the new specs.
    if let Some(last) = decls.last() {
        let mut merged: Vec<ImportFix> = file
            .imports()
            .iter()
            .filter(|spec| spec.start >= last.start_byte() && spec.end <= last.end_byte())
            .map(|spec| ImportFix::new(spec.path.clone(), spec.name.clone()))
            .collect();
        merged.extend(fixes.into_iter().cloned());
        let block = format_import_block(&merged, local_prefix);
        let text = block.trim_start_matches('\n').trim_end_matches('\n');
        return Ok(vec![TextEdit::new(last.start_byte(), last.end_byte(), text)]);
    }

    let Some(package) = file.package() else {
        anyhow::bail!("file has no package clause");
    };
    let owned: Vec<ImportFix> = fixes.into_iter().cloned().collect();
    let block = format_import_block(&owned, local_prefix);
    Ok(vec![TextEdit::insert(package.end, format!("\n{}", block.trim_end_matches('\n')))])
}

fn block_edits(
    src: &str,
    list: Node<'_>,
    fixes: &[&ImportFix],
    local_prefix: Option<&str>,
) -> Vec<TextEdit> {
    let close = list.end_byte().saturating_sub(1);
    let mut cursor = list.walk();
    let specs: Vec<ExistingSpec> = list
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "import_spec")
        .filter_map(|n| {
            let path_node = n.child_by_field_name("path")?;
            let path = crate::syntax::unquote(&src[path_node.byte_range()]);
            let line_start = src[..n.start_byte()].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let line_end = src[n.end_byte()..]
                .find('\n')
                .map(|i| n.end_byte() + i + 1)
                .unwrap_or(src.len());
            Some(ExistingSpec {
                group: import_group(&path, local_prefix),
                path,
                line_start,
                line_end,
            })
        })
        .collect();

    // Specs sharing a line with the closing paren cannot take whole-line inserts.
    let inline = specs.is_empty() || specs.iter().any(|s| s.line_end > close);
    if inline {
        let text: String = fixes.iter().map(|fix| format!("\n\t{}", fix.spec())).collect();
        return vec![TextEdit::insert(close, format!("{}\n", text))];
    }

    let mut placed: Vec<(usize, Placement, u8, String)> = Vec::new();
    for fix in fixes {
        let group = import_group(&fix.path, local_prefix);
        let line = format!("\t{}\n", fix.spec());
        let same: Vec<&ExistingSpec> = specs.iter().filter(|s| s.group == group).collect();
        let (offset, placement) = if let Some(last) = same.last() {
            let offset = same
                .iter()
                .find(|s| s.path.as_str() > fix.path.as_str())
                .map(|s| s.line_start)
                .unwrap_or(last.line_end);
            (offset, Placement::Within)
        } else if let Some(next) = specs.iter().find(|s| s.group > group) {
            (next.line_start, Placement::GroupBefore)
        } else {
            let last = specs.last().map(|s| s.line_end).unwrap_or(close);
            (last, Placement::GroupAfter)
        };
        placed.push((offset, placement, group, line));
    }

    placed.sort_by_key(|(offset, placement, group, _)| (*offset, *placement, *group));

    // One edit per insertion point; new groups each get their own separator.
    let mut edits: Vec<TextEdit> = Vec::new();
    let mut i = 0;
    while i < placed.len() {
        let (offset, placement, _, _) = placed[i];
        let mut text = String::new();
        while i < placed.len() && placed[i].0 == offset && placed[i].1 == placement {
            let group = placed[i].2;
            let mut lines = String::new();
            while i < placed.len()
                && placed[i].0 == offset
                && placed[i].1 == placement
                && placed[i].2 == group
            {
                lines.push_str(&placed[i].3);
                i += 1;
            }
            match placement {
                Placement::Within => text.push_str(&lines),
                Placement::GroupBefore => {
                    text.push_str(&lines);
                    text.push('\n');
                }
                Placement::GroupAfter => {
                    text.push('\n');
                    text.push_str(&lines);
                }
            }
        }
        edits.push(TextEdit::insert(offset, text));
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::apply_edits;

    fn add(src: &str, fixes: &[ImportFix], local: Option<&str>) -> String {
        let edits = compute_import_fix_edits(local, src, fixes).unwrap();
        apply_edits(src, &edits).unwrap()
    }

    #[test]
    fn test_assumed_names() {
        assert_eq!(import_path_to_assumed_name("fmt"), "fmt");
        assert_eq!(import_path_to_assumed_name("net/http"), "http");
        assert_eq!(import_path_to_assumed_name("example.com/foo/v2"), "foo");
        assert_eq!(import_path_to_assumed_name("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(import_path_to_assumed_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(import_path_to_assumed_name("example.com/v2"), "example");
    }

    #[test]
    fn test_groups() {
        assert_eq!(import_group("fmt", None), 0);
        assert_eq!(import_group("github.com/x/y", None), 1);
        assert_eq!(import_group("example.com/me/pkg", Some("example.com/me")), 2);
        assert_eq!(import_group("example.com/other", Some("a.com, example.com/me")), 1);
    }

    #[test]
    fn test_format_block() {
        let fixes = vec![
            ImportFix::new("example.com/mathx", None),
            ImportFix::new("testing", None),
            ImportFix::new("context", None),
        ];
        assert_eq!(
            format_import_block(&fixes, None),
            "\nimport (\n\t\"context\"\n\t\"testing\"\n\n\t\"example.com/mathx\"\n)\n"
        );
        assert_eq!(
            format_import_block(&fixes[1..2], None),
            "\nimport \"testing\"\n"
        );
    }

    #[test]
    fn test_merge_into_existing_block() {
        let src = "package a_test\n\nimport (\n\t\"fmt\"\n\t\"testing\"\n\n\t\"github.com/x/y\"\n)\n";
        let out = add(
            src,
            &[
                ImportFix::new("strings", None),
                ImportFix::new("testing", None),
                ImportFix::new("github.com/z/w", Some("zw".into())),
            ],
            None,
        );
        assert_eq!(
            out,
            "package a_test\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n\t\"testing\"\n\n\t\"github.com/x/y\"\n\tzw \"github.com/z/w\"\n)\n"
        );
    }

    #[test]
    fn test_new_group_in_block() {
        let src = "package a_test\n\nimport (\n\t\"testing\"\n)\n";
        let out = add(src, &[ImportFix::new("example.com/a", None)], None);
        assert_eq!(
            out,
            "package a_test\n\nimport (\n\t\"testing\"\n\n\t\"example.com/a\"\n)\n"
        );
    }

    #[test]
    fn test_single_import_decl_becomes_block() {
        let src = "package a\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {}\n";
        let out = add(src, &[ImportFix::new("context", None)], None);
        assert_eq!(
            out,
            "package a\n\nimport (\n\t\"context\"\n\t\"testing\"\n)\n\nfunc TestX(t *testing.T) {}\n"
        );

        let renamed = "package a\n\nimport tm \"time\"\n";
        let out = add(renamed, &[ImportFix::new("example.com/a", None)], None);
        assert_eq!(
            out,
            "package a\n\nimport (\n\ttm \"time\"\n\n\t\"example.com/a\"\n)\n"
        );
    }

    #[test]
    fn test_each_new_group_is_separated() {
        let src = "package a_test\n\nimport (\n\t\"testing\"\n)\n";
        let out = add(
            src,
            &[
                ImportFix::new("example.com/me/a", None),
                ImportFix::new("github.com/x/y", None),
            ],
            Some("example.com/me"),
        );
        assert_eq!(
            out,
            "package a_test\n\nimport (\n\t\"testing\"\n\n\t\"github.com/x/y\"\n\n\t\"example.com/me/a\"\n)\n"
        );

        let local_only = "package a_test\n\nimport (\n\t\"example.com/me/b\"\n)\n";
        let out = add(
            local_only,
            &[ImportFix::new("github.com/x/y", None), ImportFix::new("testing", None)],
            Some("example.com/me"),
        );
        assert_eq!(
            out,
            "package a_test\n\nimport (\n\t\"testing\"\n\n\t\"github.com/x/y\"\n\n\t\"example.com/me/b\"\n)\n"
        );
    }

    #[test]
    fn test_no_imports() {
        let src = "package a\n\nvar x = 1\n";
        let out = add(src, &[ImportFix::new("testing", None)], None);
        assert_eq!(out, "package a\n\nimport \"testing\"\n\nvar x = 1\n");
    }

    #[test]
    fn test_present_imports_are_skipped() {
        let src = "package a\n\nimport \"testing\"\n";
        let edits = compute_import_fix_edits(None, src, &[ImportFix::new("testing", None)]).unwrap();
        assert!(edits.is_empty());
    }
}
