//! Read-only views of a Go workspace.
//!
//! A [`Snapshot`] answers file reads and directory listings. Module
//! discovery and package loading are built on top of those two primitives,
//! so an in-memory snapshot and the real filesystem behave the same way.

use crate::package::{Package, PackageMetadata, COMMAND_LINE_ARGUMENTS};
use crate::syntax::{GoParser, ParsedGoFile};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use testgen_core::{Result, TestgenConfig, TestgenError};
use tracing::{debug, trace};

static MODULE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*module\s+"?([^\s"]+)"?\s*$"#).unwrap());

/// The module enclosing a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Directory holding go.mod
    pub root: PathBuf,
    /// Module path declared in go.mod
    pub path: String,
}

/// A consistent view of workspace files.
pub trait Snapshot {
    /// Read a file. A missing file is `Ok(None)`.
    fn read_file(&self, path: &Path) -> Result<Option<String>>;

    /// Regular files directly inside `dir`, sorted by path.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn config(&self) -> &TestgenConfig;

    /// Find the module enclosing `dir` by walking up to the nearest go.mod.
    fn find_module(&self, dir: &Path) -> Result<Option<ModuleInfo>> {
        for ancestor in dir.ancestors() {
            let go_mod = ancestor.join("go.mod");
            if let Some(content) = self.read_file(&go_mod)? {
                let Some(caps) = MODULE_DIRECTIVE.captures(&content) else {
                    return Err(TestgenError::invalid_target(format!(
                        "{} has no module directive",
                        go_mod.display()
                    )));
                };
                return Ok(Some(ModuleInfo {
                    root: ancestor.to_path_buf(),
                    path: caps[1].to_string(),
                }));
            }
        }
        Ok(None)
    }

    /// Load and check the package containing `path`.
    fn package_for_file(&self, path: &Path) -> Result<Package> {
        load_package(self, path)
    }
}

fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"))
}

fn load_package<S: Snapshot + ?Sized>(snapshot: &S, path: &Path) -> Result<Package> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut parser = GoParser::new()?;

    let Some(src) = snapshot.read_file(path)? else {
        return Err(TestgenError::invalid_target(format!(
            "{} does not exist",
            path.display()
        )));
    };
    let target = parser.parse(path, src)?;
    let Some(package_name) = target.package_name().map(str::to_string) else {
        return Err(TestgenError::invalid_target(format!(
            "{} has no package clause",
            path.display()
        )));
    };

    // Test files only join the package when the target is one of them.
    let include_tests = is_test_file(path);
    let mut files: Vec<ParsedGoFile> = Vec::new();
    for sibling in snapshot.list_dir(dir)? {
        if sibling == path || !is_go_file(&sibling) || (is_test_file(&sibling) && !include_tests) {
            continue;
        }
        let Some(src) = snapshot.read_file(&sibling)? else {
            continue;
        };
        let parsed = parser.parse(&sibling, src)?;
        if parsed.package_name() == Some(package_name.as_str()) {
            files.push(parsed);
        } else {
            trace!(file = %sibling.display(), "Skipping file from another package");
        }
    }
    files.push(target);
    files.sort_by(|a, b| a.path().cmp(b.path()));

    let metadata = match snapshot.find_module(dir)? {
        Some(module) => {
            let rel = dir.strip_prefix(&module.root).unwrap_or(dir);
            let import_path = join_import_path(&module.path, rel);
            let deps = resolve_module_deps(snapshot, &mut parser, &module, &files)?;
            PackageMetadata {
                id: import_path.clone(),
                path: import_path,
                name: package_name,
                deps_by_import_path: deps,
            }
        }
        None => PackageMetadata {
            id: COMMAND_LINE_ARGUMENTS.to_string(),
            path: COMMAND_LINE_ARGUMENTS.to_string(),
            name: package_name,
            deps_by_import_path: BTreeMap::new(),
        },
    };

    debug!(
        package = %metadata.path,
        files = files.len(),
        deps = metadata.deps_by_import_path.len(),
        "Loaded package"
    );
    Ok(Package::check(metadata, files))
}

fn join_import_path(module: &str, rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        module.to_string()
    } else {
        format!("{}/{}", module, parts.join("/"))
    }
}

/// Declared names of imported packages that live inside the module.
fn resolve_module_deps<S: Snapshot + ?Sized>(
    snapshot: &S,
    parser: &mut GoParser,
    module: &ModuleInfo,
    files: &[ParsedGoFile],
) -> Result<BTreeMap<String, String>> {
    let mut deps = BTreeMap::new();
    for spec in files.iter().flat_map(|f| f.imports()) {
        if deps.contains_key(&spec.path) {
            continue;
        }
        let rest = if spec.path == module.path {
            Some("")
        } else {
            spec.path
                .strip_prefix(module.path.as_str())
                .and_then(|r| r.strip_prefix('/'))
        };
        let Some(rest) = rest else {
            continue;
        };
        let dir = rest
            .split('/')
            .filter(|p| !p.is_empty())
            .fold(module.root.clone(), |acc, p| acc.join(p));
        for candidate in snapshot.list_dir(&dir)? {
            if !is_go_file(&candidate) || is_test_file(&candidate) {
                continue;
            }
            let Some(src) = snapshot.read_file(&candidate)? else {
                continue;
            };
            if let Some(name) = parser.parse(&candidate, src)?.package_name() {
                deps.insert(spec.path.clone(), name.to_string());
                break;
            }
        }
    }
    Ok(deps)
}

/// Snapshot over an in-memory file map.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    files: BTreeMap<PathBuf, String>,
    config: TestgenConfig,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TestgenConfig) -> Self {
        Self {
            files: BTreeMap::new(),
            config,
        }
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.files.remove(path)
    }
}

impl Snapshot for MemorySnapshot {
    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn config(&self) -> &TestgenConfig {
        &self.config
    }
}

/// Snapshot reading straight from the filesystem.
#[derive(Debug, Clone, Default)]
pub struct DiskSnapshot {
    config: TestgenConfig,
}

impl DiskSnapshot {
    pub fn new(config: TestgenConfig) -> Self {
        Self { config }
    }
}

impl Snapshot for DiskSnapshot {
    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn config(&self) -> &TestgenConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> MemorySnapshot {
        let mut snapshot = MemorySnapshot::new();
        snapshot
            .insert("/ws/go.mod", "module example.com/ws\n\ngo 1.22\n")
            .insert(
                "/ws/mathx/add.go",
                "package mathx\n\nimport \"example.com/ws/internal/fmtutil\"\n\nfunc Add(a, b int) int { return fmtutil.N(a + b) }\n",
            )
            .insert("/ws/mathx/sub.go", "package mathx\n\nfunc Sub(a, b int) int { return a - b }\n")
            .insert("/ws/mathx/add_test.go", "package mathx_test\n")
            .insert("/ws/internal/fmtutil/util.go", "package futil\n\nfunc N(x int) int { return x }\n");
        snapshot
    }

    #[test]
    fn test_find_module() {
        let snapshot = workspace();
        let module = snapshot.find_module(Path::new("/ws/mathx")).unwrap().unwrap();
        assert_eq!(module.root, PathBuf::from("/ws"));
        assert_eq!(module.path, "example.com/ws");
    }

    #[test]
    fn test_package_for_file() {
        let snapshot = workspace();
        let pkg = snapshot.package_for_file(Path::new("/ws/mathx/add.go")).unwrap();
        assert_eq!(pkg.metadata().path, "example.com/ws/mathx");
        assert_eq!(pkg.name(), "mathx");
        assert_eq!(pkg.files().len(), 2);
        assert_eq!(pkg.dep_name("example.com/ws/internal/fmtutil"), Some("futil"));
        assert!(pkg.type_errors().is_empty(), "{:?}", pkg.type_errors());
    }

    #[test]
    fn test_file_outside_module() {
        let mut snapshot = MemorySnapshot::new();
        snapshot.insert("/tmp/scratch/main.go", "package main\n\nfunc main() {}\n");
        let pkg = snapshot.package_for_file(Path::new("/tmp/scratch/main.go")).unwrap();
        assert!(pkg.metadata().is_command_line_arguments());
    }

    #[test]
    fn test_missing_file() {
        let snapshot = workspace();
        let err = snapshot.package_for_file(Path::new("/ws/nope.go")).unwrap_err();
        assert_eq!(err.kind(), testgen_core::ErrorKind::InvalidTarget);
    }
}
