//! "Add test for function": generate a table-driven test scaffold for the
//! function or method at a location.
//!
//! The pipeline runs in one synchronous pass:
//!
//! 1. [`resolver`] checks the package and finds the target declaration.
//! 2. [`edits`] picks the destination file and its test package.
//! 3. [`constructor`] and [`naming`] settle the receiver variable.
//! 4. [`qualifier`] prints every type from the destination's point of view,
//!    collecting the imports it needs.
//! 5. [`render`] produces the test text, and [`edits`] packages it with the
//!    import edits.
//!
//! Either a complete change set is returned or an error; nothing is
//! written here.

pub mod constructor;
pub mod edits;
pub mod naming;
pub mod qualifier;
pub mod render;
pub mod resolver;

use crate::package::Package;
use crate::protocol::{DocumentChange, Location};
use crate::snapshot::Snapshot;
use crate::syntax::parse_file;
use crate::types::{is_context_type, is_error_type, type_string, zero_string, Func, PackageRef, Qualifier, Signature};
use edits::{new_file_header, test_file_path, test_package_of, Destination, TestPackage};
use qualifier::{collect_imports, ImportResolver, ImportSet};
use render::{got_name, Field, Function, Receiver, TestInfo};
use testgen_core::{Result, TestgenError};
use tracing::{debug, info};

/// Parameters of `sig` as scaffold fields.
///
/// A leading `context.Context` is passed `context.Background()`, unnamed
/// and blank parameters are passed their zero value, and named parameters
/// become test case fields.
fn param_fields(sig: &Signature, q: &mut dyn Qualifier) -> Vec<Field> {
    let count = sig.params.len();
    sig.params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let ty = type_string(&param.ty, q);
            let mut field = if i == 0 && is_context_type(&param.ty) {
                let context = q.qualify(&PackageRef::context());
                Field::valued(ty, format!("{}.Background()", context))
            } else if param.name.is_empty() || param.name == "_" {
                Field::valued(ty, zero_string(&param.ty, q))
            } else {
                Field::named(param.name.clone(), ty)
            };
            field.variadic = sig.variadic && i + 1 == count;
            field
        })
        .collect()
}

fn target_function(func: &Func, q: &mut dyn Qualifier) -> Function {
    let args = param_fields(&func.signature, q);
    let count = func.signature.results.len();
    let results = func
        .signature
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let name = got_name(i, count, is_error_type(&result.ty));
            Field::named(name, type_string(&result.ty, q))
        })
        .collect();
    Function {
        name: func.name.clone(),
        args,
        results,
    }
}

fn constructor_function(ctor: &Func, var_name: &str, q: &mut dyn Qualifier) -> Function {
    let args = param_fields(&ctor.signature, q);
    let count = ctor.signature.results.len();
    let results = ctor
        .signature
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let name = if i == 0 {
                var_name.to_string()
            } else if i + 1 == count && is_error_type(&result.ty) {
                "err".to_string()
            } else {
                "_".to_string()
            };
            Field::named(name, type_string(&result.ty, q))
        })
        .collect();
    Function {
        name: ctor.name.clone(),
        args,
        results,
    }
}

fn build_receiver(pkg: &Package, func: &Func, xtest: bool, q: &mut dyn Qualifier) -> Result<Option<Receiver>> {
    let Some(recv) = &func.recv else {
        return Ok(None);
    };
    let base = resolver::receiver_base(func)
        .ok_or_else(|| TestgenError::resolution("method without receiver type"))?;
    let type_name = resolver::receiver_type_name(func)?;
    let var_name = naming::receiver_var_name(&recv.name, type_name);

    let want = crate::types::receiver_named(&recv.ty).ok_or_else(|| {
        TestgenError::resolution(format!("receiver of {} has no named type", func.name))
    })?;
    let candidates = pkg.scope_funcs();
    let constructor = constructor::find_constructor(&candidates, want, type_name, xtest);
    debug!(
        receiver = %type_name,
        var = %var_name,
        constructor = constructor.map(|c| c.name.as_str()).unwrap_or("<none>"),
        "Resolved receiver"
    );

    Ok(Some(Receiver {
        var: Field::named(var_name.clone(), type_string(base, q)),
        constructor: constructor.map(|c| constructor_function(c, &var_name, q)),
    }))
}

/// Rename constructor parameters that clash with the target's parameters.
fn resolve_collisions(info: &mut TestInfo) {
    let Some(ctor) = info.receiver.as_mut().and_then(|r| r.constructor.as_mut()) else {
        return;
    };
    let taken: Vec<&str> = info.func.args.iter().map(|a| a.name.as_str()).collect();
    let names: Vec<&str> = ctor.args.iter().map(|a| a.name.as_str()).collect();
    let prefix = naming::collision_free_prefix(&taken, &names);
    if prefix.is_empty() {
        return;
    }
    for arg in ctor.args.iter_mut().filter(|a| !a.name.is_empty()) {
        arg.name = format!("{}{}", prefix, arg.name);
    }
}

/// Generate a test for the function or method enclosing `loc`.
///
/// Returns the document changes that create or extend `<file>_test.go`.
pub fn add_test_for_func(snapshot: &dyn Snapshot, loc: &Location) -> Result<Vec<DocumentChange>> {
    let pkg = snapshot.package_for_file(&loc.path)?;
    resolver::check_package(&pkg)?;

    let subject = pkg.file(&loc.path).ok_or_else(|| {
        TestgenError::resolution(format!("{} is not part of its package", loc.path.display()))
    })?;
    let file_imports = collect_imports(subject, &pkg)?;

    let dest_path = test_file_path(&loc.path);
    let (destination, test_imports, mode) = match snapshot.read_file(&dest_path)? {
        Some(src) => {
            let file = parse_file(&dest_path, src)?;
            let mode = test_package_of(pkg.name(), &file)?;
            let imports = collect_imports(&file, &pkg)?;
            (Destination::Existing { file }, imports, mode)
        }
        None => {
            let header = new_file_header(subject, pkg.name());
            let destination = Destination::New {
                path: dest_path.clone(),
                header,
            };
            (destination, ImportSet::new(), TestPackage::External)
        }
    };
    let xtest = mode.is_external();
    debug!(dest = %destination.path().display(), ?mode, "Selected destination");

    let (start, end) = subject
        .lines()
        .range_offsets(loc.range)
        .map_err(|e| TestgenError::invalid_target(e.to_string()))?;
    let func = resolver::enclosing_func(&pkg, subject, start, end)?;
    if xtest {
        resolver::check_visibility(func, pkg.name())?;
    }

    let mut test_name = resolver::test_name(func)?;
    if let Destination::Existing { file } = &destination {
        test_name = naming::unique_test_name(&test_name, &file.top_level_func_names());
    }

    let mut qf = ImportResolver::new(pkg.package_ref(), xtest, &test_imports, &file_imports);
    let testing_package = qf.qualify(&PackageRef::testing());
    let package = qf.qualify(&pkg.package_ref());
    let target = target_function(func, &mut qf);
    let receiver = build_receiver(&pkg, func, xtest, &mut qf)?;

    let mut info = TestInfo {
        testing_package,
        package,
        test_name,
        func: target,
        receiver,
    };
    resolve_collisions(&mut info);

    let test = render::render_test(&info)?;
    let fixes = qf.import_fixes();
    let local_prefix = snapshot.config().local_prefix();

    info!(
        test = %info.test_name,
        dest = %destination.path().display(),
        new_imports = fixes.len(),
        "Generated test scaffold"
    );
    destination.into_changes(test, &fixes, local_prefix)
}
