use thiserror::Error;

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;

/// Failures surfaced by the class loader and the resolver.
///
/// None of these are recovered from internally; callers attach source positions and report.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot find class {name}")]
    ClassNotFound { name: String },
    #[error("cannot find field {name} in {owner}")]
    FieldNotFound { owner: String, name: String },
    #[error("cannot find method {name}({}) in {owner}", .args.join(", "))]
    MethodNotFound {
        owner: String,
        name: String,
        args: Vec<String>,
    },
    #[error("{context}: {source}")]
    Internal {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ResolveError {
    pub fn class_not_found(name: impl Into<String>) -> Self {
        ResolveError::ClassNotFound { name: name.into() }
    }

    pub fn internal(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ResolveError::Internal {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_class_not_found(&self) -> bool {
        matches!(self, ResolveError::ClassNotFound { .. })
    }
}
