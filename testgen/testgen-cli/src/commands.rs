//! Command implementations for the testgen CLI.

use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use testgen_core::TestgenConfig;
use testgen_golang::{
    add_test_for_func, apply_edits, DiskSnapshot, DocumentChange, Location, Position, Range,
    Snapshot,
};
use tracing::{info, warn};

/// Arguments of `testgen add-test`. Lines and columns are one-based.
#[derive(Debug, Clone)]
pub struct AddTestArgs {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub end_line: Option<usize>,
    pub end_column: Option<usize>,
    pub write: bool,
}

impl AddTestArgs {
    /// The zero-based location these arguments select.
    pub fn location(&self) -> Result<Location> {
        let zero = |value: usize, what: &str| -> Result<usize> {
            if value == 0 {
                bail!("{} is one-based and must be at least 1", what);
            }
            Ok(value - 1)
        };
        let start = Position::new(zero(self.line, "--line")?, zero(self.column, "--column")?);
        let end = match (self.end_line, self.end_column) {
            (None, None) => start,
            (Some(line), Some(column)) => {
                Position::new(zero(line, "--end-line")?, zero(column, "--end-column")?)
            }
            _ => bail!("--end-line and --end-column must be given together"),
        };
        Ok(Location::new(self.file.clone(), Range::new(start, end)))
    }
}

/// Final contents of every file touched by `changes`.
pub fn preview(snapshot: &dyn Snapshot, changes: &[DocumentChange]) -> Result<BTreeMap<PathBuf, String>> {
    let mut files: BTreeMap<PathBuf, String> = BTreeMap::new();
    for change in changes {
        match change {
            DocumentChange::Create { path } => {
                if snapshot.read_file(path)?.is_some() {
                    bail!("refusing to create {}: file exists", path.display());
                }
                files.insert(path.clone(), String::new());
            }
            DocumentChange::Edit { path, edits } => {
                let current = match files.remove(path) {
                    Some(content) => content,
                    None => snapshot
                        .read_file(path)?
                        .with_context(|| format!("cannot edit missing file {}", path.display()))?,
                };
                let updated = apply_edits(&current, edits)
                    .with_context(|| format!("failed to apply edits to {}", path.display()))?;
                files.insert(path.clone(), updated);
            }
        }
    }
    Ok(files)
}

/// Write previewed files to disk.
pub fn write_files(files: &BTreeMap<PathBuf, String>) -> Result<()> {
    for (path, content) in files {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = content.len(), "Wrote file");
    }
    Ok(())
}

#[derive(Serialize)]
struct AddTestReport<'a> {
    changes: &'a [DocumentChange],
    written: bool,
}

/// `testgen add-test`
pub fn add_test(config: TestgenConfig, args: &AddTestArgs, format: OutputFormat) -> Result<()> {
    let snapshot = DiskSnapshot::new(config);
    let location = args.location()?;
    let changes = add_test_for_func(&snapshot, &location)?;
    let files = preview(&snapshot, &changes)?;

    if args.write {
        write_files(&files)?;
    } else if files.is_empty() {
        warn!("No changes produced");
    }

    match format {
        OutputFormat::Json => output::json(&AddTestReport {
            changes: &changes,
            written: args.write,
        })?,
        OutputFormat::Human => {
            for (path, content) in &files {
                if args.write {
                    output::success(format!("Updated {}", path.display()));
                } else {
                    output::header(path.display());
                    output::listing(content);
                }
            }
            if !args.write {
                output::info("Run again with --write to apply these changes");
            }
        }
    }
    Ok(())
}

/// `testgen config show`
pub fn config_show(config: &TestgenConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => output::json(config),
        OutputFormat::Human => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// `testgen config init`
pub fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    TestgenConfig::default().save_to_path(path)?;
    output::success(format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(file: PathBuf) -> AddTestArgs {
        AddTestArgs {
            file,
            line: 3,
            column: 6,
            end_line: None,
            end_column: None,
            write: true,
        }
    }

    #[test]
    fn test_location_is_zero_based() {
        let loc = args(PathBuf::from("a.go")).location().unwrap();
        assert_eq!(loc.range.start, Position::new(2, 5));
        assert_eq!(loc.range.end, Position::new(2, 5));

        let mut bad = args(PathBuf::from("a.go"));
        bad.line = 0;
        assert!(bad.location().is_err());

        let mut half = args(PathBuf::from("a.go"));
        half.end_line = Some(4);
        assert!(half.location().is_err());
    }

    #[test]
    fn test_add_test_writes_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/ws\n").unwrap();
        let src = dir.path().join("add.go");
        std::fs::write(&src, "package ws\n\nfunc Add(a, b int) int { return a + b }\n").unwrap();

        add_test(TestgenConfig::default(), &args(src), OutputFormat::Json).unwrap();

        let written = std::fs::read_to_string(dir.path().join("add_test.go")).unwrap();
        assert!(written.starts_with("package ws_test\n"));
        assert!(written.contains("func TestAdd(t *testing.T) {"));
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("testgen.toml");
        config_init(&path, false).unwrap();
        assert!(config_init(&path, false).is_err());
        config_init(&path, true).unwrap();
        assert!(TestgenConfig::load_from_path(&path).is_ok());
    }
}
