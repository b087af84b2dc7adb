//! Error types for test scaffold generation.

/// Result type alias for testgen operations.
pub type Result<T> = std::result::Result<T, TestgenError>;

/// Main error type for testgen.
#[derive(Debug, thiserror::Error)]
pub enum TestgenError {
    /// The package cannot be used: parse/type errors, or a synthetic package
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The selection is not inside a function or method declaration
    #[error("No enclosing function")]
    NoEnclosingFunction,

    /// An external test package cannot see the target
    #[error("Unexported target: {0}")]
    UnexportedTarget(String),

    /// A file uses an import form that cannot be re-qualified (dot imports)
    #[error("Unsupported import form: {0}")]
    UnsupportedImportForm(String),

    /// The destination test file declares an incompatible package
    #[error("Package mismatch: {0}")]
    PackageMismatch(String),

    /// Missing or inconsistent type information
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// The scaffold data violates a rendering invariant
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a [`TestgenError`], stable across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTarget,
    NoEnclosingFunction,
    UnexportedTarget,
    UnsupportedImportForm,
    PackageMismatch,
    Resolution,
    Render,
    Config,
    Io,
    Serialization,
    Other,
}

impl TestgenError {
    /// Create a new invalid target error
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Create a new unexported target error
    pub fn unexported(msg: impl Into<String>) -> Self {
        Self::UnexportedTarget(msg.into())
    }

    /// Create a new unsupported import form error
    pub fn unsupported_import(msg: impl Into<String>) -> Self {
        Self::UnsupportedImportForm(msg.into())
    }

    /// Create a new package mismatch error
    pub fn package_mismatch(msg: impl Into<String>) -> Self {
        Self::PackageMismatch(msg.into())
    }

    /// Create a new resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTarget(_) => ErrorKind::InvalidTarget,
            Self::NoEnclosingFunction => ErrorKind::NoEnclosingFunction,
            Self::UnexportedTarget(_) => ErrorKind::UnexportedTarget,
            Self::UnsupportedImportForm(_) => ErrorKind::UnsupportedImportForm,
            Self::PackageMismatch(_) => ErrorKind::PackageMismatch,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Render(_) => ErrorKind::Render,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the user can fix the condition in their source and retry.
    ///
    /// Render errors and internal wrapper errors indicate a defect instead.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidTarget
                | ErrorKind::NoEnclosingFunction
                | ErrorKind::UnexportedTarget
                | ErrorKind::UnsupportedImportForm
                | ErrorKind::PackageMismatch
        )
    }

    /// Check if this is a render error
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            TestgenError::NoEnclosingFunction.kind(),
            ErrorKind::NoEnclosingFunction
        );
        assert_eq!(
            TestgenError::unsupported_import("dot import").kind(),
            ErrorKind::UnsupportedImportForm
        );
        assert_eq!(
            TestgenError::package_mismatch("x").kind(),
            ErrorKind::PackageMismatch
        );
    }

    #[test]
    fn test_user_errors() {
        assert!(TestgenError::invalid_target("parse errors").is_user_error());
        assert!(TestgenError::unexported("foo").is_user_error());
        assert!(!TestgenError::render("bad field").is_user_error());
        assert!(!TestgenError::resolution("no object").is_user_error());
    }

    #[test]
    fn test_display_messages() {
        let err = TestgenError::unexported("cannot add test of unexported function foo");
        assert_eq!(
            err.to_string(),
            "Unexported target: cannot add test of unexported function foo"
        );
        assert_eq!(
            TestgenError::NoEnclosingFunction.to_string(),
            "No enclosing function"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: TestgenError = anyhow::anyhow!("boom").into();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.to_string(), "boom");
    }
}
