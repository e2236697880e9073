//! Error types for resolution and dispatch.

use carrier_bundle::{HandlerError, Operation};
use carrier_model::{DescriptorError, HandlerTextError};
use thiserror::Error;

/// Failure turning handler text into a live bundle. Never cached.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("no handler factory registered under '{0}'")]
    UnknownFactory(String),
    #[error("handler factory '{name}' failed: {reason}")]
    Factory { name: String, reason: String },
    #[error("exec handlers are disabled (start the provider with --allow-exec)")]
    ExecDisabled,
    #[error("failed to run handler program {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("handler program {program} could not describe itself: {reason}")]
    Describe { program: String, reason: String },
    #[error("resolver backend error: {0}")]
    Backend(String),
}

/// Error type for lifecycle dispatch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{operation}: no usable handler: {source}")]
    MissingHandler {
        operation: Operation,
        #[source]
        source: HandlerTextError,
    },
    #[error("handler does not implement {0}")]
    NotImplemented(Operation),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ProviderError {
    /// Stable machine-readable code, used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHandler { .. } => "missing_handler",
            Self::NotImplemented(_) => "not_implemented",
            Self::Resolve(_) => "resolve_failed",
            Self::Handler(_) => "handler_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let err = ProviderError::NotImplemented(Operation::Create);
        assert_eq!(err.code(), "not_implemented");
        assert_eq!(err.to_string(), "handler does not implement create");

        let err = ProviderError::MissingHandler {
            operation: Operation::Read,
            source: HandlerTextError::Missing,
        };
        assert_eq!(err.code(), "missing_handler");
        assert!(err.to_string().starts_with("read: no usable handler"));

        // Handler failures are shown exactly as the handler wrote them.
        let err = ProviderError::from(HandlerError::msg("bucket is not empty"));
        assert_eq!(err.to_string(), "bucket is not empty");

        // So are resolution failures, with no extra prefix.
        let err = ProviderError::from(ResolveError::UnknownFactory("bucket".into()));
        assert_eq!(err.code(), "resolve_failed");
        assert_eq!(err.to_string(), "no handler factory registered under 'bucket'");
    }
}
