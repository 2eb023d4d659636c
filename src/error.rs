//! # Error Handling
//!
//! This module defines the centralized error type for `manifest-engine`. It
//! uses `thiserror` to build a single `Error` enum covering every failure
//! the orchestration layer can surface, so callers match on one type no
//! matter which component produced the failure.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failure modes. Variants fall into a few
//!   groups:
//!   - configuration errors, raised eagerly by constructors and builders;
//!   - execution errors, which wrap an inner error with the failing Source
//!     (`Error::Source`) or the offending object (`Error::Object`);
//!   - collaborator errors raised by selectors, mutators, renderers and
//!     builders;
//!   - cache, filesystem and decoding errors, surfaced as-is.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Object context is attached idempotently: `Error::for_object` returns an
//! error that already carries object identity unchanged, so the identity a
//! caller extracts is always the one closest to the failure.

use thiserror::Error;

use crate::object::Object;

/// Main error type for manifest-engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// A component was constructed with invalid configuration.
    ///
    /// Raised at construction time, never from `render` or `process`.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A Source failed while producing its objects.
    #[error("Source #{index} ({name}) failed: {source}")]
    Source {
        index: usize,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A selector or mutator failed while processing a specific object.
    #[error("Error processing {kind} {}: {source}", display_name(.namespace.as_deref(), .name))]
    Object {
        kind: String,
        name: String,
        namespace: Option<String>,
        #[source]
        source: Box<Error>,
    },

    /// A selector reported a failure.
    #[error("Selector error: {message}")]
    Selector { message: String },

    /// A mutator reported a failure.
    #[error("Mutator error: {message}")]
    Mutator { message: String },

    /// An external render or build engine reported a failure.
    #[error("Render error: {engine} - {message}")]
    Render { engine: String, message: String },

    /// A filesystem operation failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An operation the component refuses to perform.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// A cache operation failed.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// A document could not be decoded into objects.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The render was cancelled through its context.
    #[error("Operation cancelled")]
    Cancelled,

    /// An error indicating that a lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

fn display_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Attach the identity of `obj` to `err`.
    ///
    /// Errors that already carry object identity are returned unchanged.
    pub fn for_object(obj: &Object, err: Error) -> Self {
        if err.is_object_error() {
            return err;
        }
        Error::Object {
            kind: obj.kind().to_string(),
            name: obj.name().to_string(),
            namespace: obj.namespace().map(str::to_string),
            source: Box::new(err),
        }
    }

    /// Attach the index and name of the failing Source to `err`.
    pub fn for_source(index: usize, name: &str, err: Error) -> Self {
        if let Error::Source { .. } = err {
            return err;
        }
        Error::Source {
            index,
            name: name.to_string(),
            source: Box::new(err),
        }
    }

    fn is_object_error(&self) -> bool {
        matches!(self, Error::Object { .. })
    }

    /// Identity `(kind, name, namespace)` of the object closest to the failure.
    pub fn object_identity(&self) -> Option<(&str, &str, Option<&str>)> {
        match self {
            Error::Object {
                kind,
                name,
                namespace,
                ..
            } => Some((kind.as_str(), name.as_str(), namespace.as_deref())),
            Error::Source { source, .. } => source.object_identity(),
            _ => None,
        }
    }

    /// Index and name of the Source that failed, if any.
    pub fn source_identity(&self) -> Option<(usize, &str)> {
        match self {
            Error::Source { index, name, .. } => Some((*index, name.as_str())),
            _ => None,
        }
    }

    /// The innermost error, with all context layers removed.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Source { source, .. } | Error::Object { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment() -> Object {
        Object::from_value(json!({
            "kind": "Deployment",
            "metadata": {"name": "web", "namespace": "prod"}
        }))
        .unwrap()
    }

    #[test]
    fn test_error_display_config() {
        let error = Error::config("source name must not be empty");
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("source name must not be empty"));
    }

    #[test]
    fn test_for_object_attaches_identity() {
        let err = Error::for_object(
            &deployment(),
            Error::Mutator {
                message: "boom".to_string(),
            },
        );
        let display = format!("{}", err);
        assert!(display.contains("Deployment prod/web"));
        assert!(display.contains("boom"));
        assert_eq!(err.object_identity(), Some(("Deployment", "web", Some("prod"))));
    }

    #[test]
    fn test_for_object_is_idempotent() {
        let inner = Error::for_object(
            &deployment(),
            Error::Selector {
                message: "denied".to_string(),
            },
        );
        let other = Object::from_value(json!({"kind": "Service", "metadata": {"name": "svc"}}))
            .unwrap();
        let outer = Error::for_object(&other, inner);

        assert_eq!(outer.object_identity(), Some(("Deployment", "web", Some("prod"))));
        match outer {
            Error::Object { source, .. } => assert!(matches!(*source, Error::Selector { .. })),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_for_source_reports_index_and_name() {
        let err = Error::for_source(
            1,
            "chart",
            Error::Render {
                engine: "chart".to_string(),
                message: "missing values".to_string(),
            },
        );
        assert_eq!(err.source_identity(), Some((1, "chart")));
        let display = format!("{}", err);
        assert!(display.contains("Source #1 (chart)"));
        assert!(matches!(err.root_cause(), Error::Render { .. }));
    }

    #[test]
    fn test_object_identity_through_source_layer() {
        let err = Error::for_source(
            0,
            "files",
            Error::for_object(&deployment(), Error::Cancelled),
        );
        assert_eq!(err.object_identity(), Some(("Deployment", "web", Some("prod"))));
        assert!(matches!(err.root_cause(), Error::Cancelled));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error =
            serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML error"));
    }

    #[test]
    fn test_error_unsupported() {
        let error = Error::Unsupported {
            operation: "remove_all".to_string(),
        };
        assert!(format!("{}", error).contains("Unsupported operation: remove_all"));
    }
}
