//! Package qualification and import bookkeeping for the generated test.
//!
//! Three import sets are involved: the subject file's imports, the
//! destination test file's imports, and the imports the generated code
//! needs on top of those. The first two are read-only inputs; the third is
//! accumulated by [`ImportResolver`] while types are printed.

use crate::imports::{import_path_to_assumed_name, ImportFix};
use crate::package::Package;
use crate::syntax::ParsedGoFile;
use crate::types::{PackageRef, Qualifier};
use std::collections::BTreeMap;
use testgen_core::{Result, TestgenError};

/// Local name of an imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub name: String,
    /// Imported under an explicit name
    pub renamed: bool,
}

impl ImportInfo {
    pub fn new(name: impl Into<String>, renamed: bool) -> Self {
        Self {
            name: name.into(),
            renamed,
        }
    }
}

/// Import path -> local name.
pub type ImportSet = BTreeMap<String, ImportInfo>;

/// Collect the imports of `file`, keyed by path.
///
/// Blank imports are ignored. Dot imports are rejected: names they bring
/// into scope cannot be re-qualified in another file.
pub fn collect_imports(file: &ParsedGoFile, pkg: &Package) -> Result<ImportSet> {
    let mut imports = ImportSet::new();
    for spec in file.imports() {
        if spec.is_dot() {
            return Err(TestgenError::unsupported_import(format!(
                "\"add a test for func\" does not support files containing dot imports ({} imports {:?})",
                file.path().display(),
                spec.path
            )));
        }
        if spec.is_blank() {
            continue;
        }
        let info = match &spec.name {
            Some(name) => ImportInfo::new(name.clone(), true),
            None => {
                let name = pkg
                    .dep_name(&spec.path)
                    .map(str::to_string)
                    .unwrap_or_else(|| import_path_to_assumed_name(&spec.path));
                ImportInfo::new(name, false)
            }
        };
        imports.insert(spec.path.clone(), info);
    }
    Ok(imports)
}

/// Decides how packages are referenced from the destination test file and
/// records the imports that must be added to it.
#[derive(Debug)]
pub struct ImportResolver<'a> {
    subject: PackageRef,
    xtest: bool,
    test_imports: &'a ImportSet,
    file_imports: &'a ImportSet,
    extra: ImportSet,
}

impl<'a> ImportResolver<'a> {
    pub fn new(
        subject: PackageRef,
        xtest: bool,
        test_imports: &'a ImportSet,
        file_imports: &'a ImportSet,
    ) -> Self {
        Self {
            subject,
            xtest,
            test_imports,
            file_imports,
            extra: ImportSet::new(),
        }
    }

    /// Imports the generated code needs that the destination lacks.
    pub fn extra(&self) -> &ImportSet {
        &self.extra
    }

    /// Import fixes for the extra imports, in path order.
    pub fn import_fixes(&self) -> Vec<ImportFix> {
        self.extra
            .iter()
            .map(|(path, info)| ImportFix::new(path.clone(), info.renamed.then(|| info.name.clone())))
            .collect()
    }

    fn name_taken(&self, name: &str, path: &str) -> bool {
        let bound = |set: &ImportSet| set.iter().any(|(p, info)| p != path && info.name == name);
        bound(self.test_imports) || bound(&self.extra)
    }

    fn fresh_name(&self, base: &str, path: &str) -> String {
        (2..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !self.name_taken(candidate, path))
            .unwrap_or_else(|| base.to_string())
    }
}

impl Qualifier for ImportResolver<'_> {
    fn qualify(&mut self, pkg: &PackageRef) -> String {
        if !self.xtest && pkg.path == self.subject.path {
            return String::new();
        }
        if let Some(local) = self.test_imports.get(&pkg.path) {
            return local.name.clone();
        }
        if let Some(local) = self.extra.get(&pkg.path) {
            return local.name.clone();
        }

        let mut info = self
            .file_imports
            .get(&pkg.path)
            .cloned()
            .unwrap_or_else(|| ImportInfo::new(pkg.name.clone(), false));
        if self.name_taken(&info.name, &pkg.path) {
            info = ImportInfo::new(self.fresh_name(&info.name, &pkg.path), true);
        }
        let name = info.name.clone();
        self.extra.insert(pkg.path.clone(), info);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, &str, bool)]) -> ImportSet {
        entries
            .iter()
            .map(|(path, name, renamed)| (path.to_string(), ImportInfo::new(*name, *renamed)))
            .collect()
    }

    #[test]
    fn test_white_box_subject_is_unqualified() {
        let (test, file) = (ImportSet::new(), ImportSet::new());
        let subject = PackageRef::new("example.com/mathx", "mathx");
        let mut resolver = ImportResolver::new(subject.clone(), false, &test, &file);
        assert_eq!(resolver.qualify(&subject), "");
        assert!(resolver.extra().is_empty());
    }

    #[test]
    fn test_black_box_subject_is_imported() {
        let (test, file) = (ImportSet::new(), ImportSet::new());
        let subject = PackageRef::new("example.com/mathx", "mathx");
        let mut resolver = ImportResolver::new(subject.clone(), true, &test, &file);
        assert_eq!(resolver.qualify(&subject), "mathx");
        assert_eq!(
            resolver.import_fixes(),
            vec![ImportFix::new("example.com/mathx", None)]
        );
    }

    #[test]
    fn test_lookup_order() {
        let test = set(&[("testing", "testing", false)]);
        let file = set(&[("example.com/geo/v2", "geo", true)]);
        let subject = PackageRef::new("example.com/mathx", "mathx");
        let mut resolver = ImportResolver::new(subject, true, &test, &file);

        assert_eq!(resolver.qualify(&PackageRef::testing()), "testing");
        assert_eq!(resolver.qualify(&PackageRef::new("example.com/geo/v2", "geo")), "geo");
        assert_eq!(resolver.qualify(&PackageRef::new("strings", "strings")), "strings");
        assert_eq!(
            resolver.import_fixes(),
            vec![
                ImportFix::new("example.com/geo/v2", Some("geo".into())),
                ImportFix::new("strings", None),
            ]
        );
    }

    #[test]
    fn test_conflicting_name_gets_fresh_alias() {
        let test = set(&[("example.com/a/log", "log", false)]);
        let file = ImportSet::new();
        let subject = PackageRef::new("example.com/mathx", "mathx");
        let mut resolver = ImportResolver::new(subject, true, &test, &file);

        let std_log = PackageRef::new("log", "log");
        assert_eq!(resolver.qualify(&std_log), "log2");
        // Repeated lookups keep the same alias.
        assert_eq!(resolver.qualify(&std_log), "log2");
        assert_eq!(resolver.import_fixes(), vec![ImportFix::new("log", Some("log2".into()))]);
    }
}
