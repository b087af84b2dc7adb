//! Placement of the generated test: which file, which package, and the
//! final edit list.

use crate::imports::{compute_import_fix_edits, format_import_block, ImportFix};
use crate::protocol::{DocumentChange, TextEdit};
use crate::syntax::ParsedGoFile;
use std::path::{Path, PathBuf};
use testgen_core::{Result, TestgenError};

/// `dir/foo.go` -> `dir/foo_test.go`.
pub fn test_file_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(".go").unwrap_or(&name);
    path.with_file_name(format!("{}_test.go", base))
}

/// Package of the destination test file relative to the subject package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPackage {
    /// Same package as the subject ("white-box")
    Internal,
    /// `<name>_test` ("black-box")
    External,
}

impl TestPackage {
    pub fn is_external(self) -> bool {
        self == TestPackage::External
    }
}

/// Classify an existing destination file by its package clause.
pub fn test_package_of(subject_package: &str, dest: &ParsedGoFile) -> Result<TestPackage> {
    let Some(declared) = dest.package_name() else {
        return Err(TestgenError::package_mismatch(format!(
            "missing package declaration in {}",
            dest.path().display()
        )));
    };
    if declared == subject_package {
        Ok(TestPackage::Internal)
    } else if declared.strip_suffix("_test") == Some(subject_package) {
        Ok(TestPackage::External)
    } else {
        Err(TestgenError::package_mismatch(format!(
            "invalid package declaration {:?} in test file {:?}",
            declared,
            dest.path().display().to_string()
        )))
    }
}

/// Header of a new test file: the subject's copyright header, if any, and
/// an external test package clause.
pub fn new_file_header(subject: &ParsedGoFile, package_name: &str) -> String {
    let mut header = String::new();
    if let Some(copyright) = subject.copyright_header() {
        header.push_str(copyright);
        header.push_str("\n\n");
    }
    header.push_str(&format!("package {}_test\n", package_name));
    header
}

/// Where the test goes.
#[derive(Debug)]
pub enum Destination {
    New { path: PathBuf, header: String },
    Existing { file: ParsedGoFile },
}

impl Destination {
    pub fn path(&self) -> &Path {
        match self {
            Destination::New { path, .. } => path,
            Destination::Existing { file } => file.path(),
        }
    }

    /// Assemble the change set for `test` and its missing imports.
    pub fn into_changes(
        self,
        test: String,
        fixes: &[ImportFix],
        local_prefix: Option<&str>,
    ) -> Result<Vec<DocumentChange>> {
        match self {
            Destination::New { path, header } => {
                // All inserts target offset 0 of an empty file and apply in order.
                let edits = vec![
                    TextEdit::insert(0, header),
                    TextEdit::insert(0, format_import_block(fixes, local_prefix)),
                    TextEdit::insert(0, test),
                ];
                Ok(vec![
                    DocumentChange::Create { path: path.clone() },
                    DocumentChange::Edit { path, edits },
                ])
            }
            Destination::Existing { file } => {
                let mut edits = compute_import_fix_edits(local_prefix, file.src(), fixes)
                    .map_err(|e| {
                        TestgenError::resolution(format!(
                            "could not compute the import fix edits: {}",
                            e
                        ))
                    })?;
                edits.push(TextEdit::insert(file.end_offset(), test));
                Ok(vec![DocumentChange::Edit {
                    path: file.path().to_path_buf(),
                    edits,
                }])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::apply_edits;
    use crate::syntax::parse_file;

    #[test]
    fn test_test_file_path() {
        assert_eq!(
            test_file_path(Path::new("/ws/mathx/add.go")),
            PathBuf::from("/ws/mathx/add_test.go")
        );
    }

    #[test]
    fn test_package_classification() {
        let internal = parse_file("a_test.go", "package mathx\n").unwrap();
        let external = parse_file("a_test.go", "package mathx_test\n").unwrap();
        let other = parse_file("a_test.go", "package other\n").unwrap();
        assert_eq!(test_package_of("mathx", &internal).unwrap(), TestPackage::Internal);
        assert_eq!(test_package_of("mathx", &external).unwrap(), TestPackage::External);
        let err = test_package_of("mathx", &other).unwrap_err();
        assert_eq!(err.kind(), testgen_core::ErrorKind::PackageMismatch);
    }

    #[test]
    fn test_header_copies_copyright_only() {
        let with = parse_file(
            "a.go",
            "// Copyright 2024 Example Authors.\n// All rights reserved.\n\n// Package a does things.\npackage a\n",
        )
        .unwrap();
        assert_eq!(
            new_file_header(&with, "a"),
            "// Copyright 2024 Example Authors.\n// All rights reserved.\n\npackage a_test\n"
        );

        let doc_only = parse_file("a.go", "// Copyright notice as package doc.\npackage a\n").unwrap();
        assert_eq!(new_file_header(&doc_only, "a"), "package a_test\n");

        let directive = parse_file("a.go", "//go:build copyright\n\npackage a\n").unwrap();
        assert_eq!(new_file_header(&directive, "a"), "package a_test\n");
    }

    #[test]
    fn test_new_file_changes() {
        let dest = Destination::New {
            path: PathBuf::from("a_test.go"),
            header: "package a_test\n".into(),
        };
        let changes = dest
            .into_changes("\nfunc TestX(t *testing.T) {\n}\n".into(), &[ImportFix::new("testing", None)], None)
            .unwrap();
        assert_eq!(changes.len(), 2);
        let DocumentChange::Edit { edits, .. } = &changes[1] else {
            panic!("expected edit");
        };
        assert_eq!(
            apply_edits("", edits).unwrap(),
            "package a_test\n\nimport \"testing\"\n\nfunc TestX(t *testing.T) {\n}\n"
        );
    }
}
