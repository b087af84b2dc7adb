//! Go test scaffold generation.
//!
//! Given a location inside a Go function or method, [`add_test_for_func`]
//! produces the edits that add a table-driven test for it to the companion
//! `_test.go` file.
//!
//! The crate carries its own lightweight Go front end: a tree-sitter based
//! [`syntax`] layer, a signature-level [`package`] checker, and
//! [`snapshot`]s that load packages from memory or disk.
//!
//! # Example
//!
//! ```no_run
//! use testgen_golang::{add_test_for_func, Location, MemorySnapshot};
//!
//! let mut snapshot = MemorySnapshot::new();
//! snapshot
//!     .insert("/ws/go.mod", "module example.com/ws\n")
//!     .insert("/ws/mathx/add.go", "package mathx\n\nfunc Add(a, b int) int { return a + b }\n");
//!
//! let changes = add_test_for_func(&snapshot, &Location::at("/ws/mathx/add.go", 2, 5)).unwrap();
//! for change in &changes {
//!     println!("{}", change.path().display());
//! }
//! ```

pub mod addtest;
pub mod imports;
pub mod package;
pub mod protocol;
pub mod snapshot;
pub mod syntax;
pub mod types;

pub use addtest::add_test_for_func;
pub use package::{Package, PackageMetadata};
pub use protocol::{apply_edits, DocumentChange, Location, Position, Range, TextEdit};
pub use snapshot::{DiskSnapshot, MemorySnapshot, ModuleInfo, Snapshot};
pub use syntax::{GoParser, ParsedGoFile};
