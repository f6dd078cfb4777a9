//! Error types for host functions.
//!
//! Handler failures are never shown to guest code as-is. Each error reports
//! an [`ErrorClass`], and only the class decides what the guest sees.

use holomush_capability::CapabilityError;
use holomush_world::WorldError;
use thiserror::Error;

/// How a failure is presented to guest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Timeout,
    NotFound,
    AccessDenied,
    Internal,
}

/// Errors that can be classified for sanitization.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}

impl Classify for WorldError {
    fn class(&self) -> ErrorClass {
        match self {
            WorldError::NotFound(_) => ErrorClass::NotFound,
            WorldError::PermissionDenied(_) => ErrorClass::AccessDenied,
            WorldError::Timeout => ErrorClass::Timeout,
            WorldError::Validation(_) | WorldError::Storage(_) => ErrorClass::Internal,
        }
    }
}

/// Errors from a key-value store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("kv operation timed out")]
    Timeout,

    #[error("kv backend error: {0}")]
    Backend(String),
}

impl Classify for KvError {
    fn class(&self) -> ErrorClass {
        match self {
            KvError::Timeout => ErrorClass::Timeout,
            KvError::Backend(_) => ErrorClass::Internal,
        }
    }
}

/// A world service failure tagged with the plugin and entity type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("plugin {plugin}: {entity_type} query failed: {source}")]
pub struct QueryError {
    pub plugin: String,
    pub entity_type: &'static str,
    #[source]
    pub source: WorldError,
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        self.source.is_not_found()
    }
}

impl Classify for QueryError {
    fn class(&self) -> ErrorClass {
        self.source.class()
    }
}

/// Errors from an access policy engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("access evaluation failed: {0}")]
pub struct AccessError(pub String);

/// Any failure a host function handler can hit after its capability check.
#[derive(Error, Debug)]
pub enum HostError {
    /// The call deadline passed before the collaborator answered.
    #[error("deadline exceeded")]
    Timeout,

    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl Classify for HostError {
    fn class(&self) -> ErrorClass {
        match self {
            HostError::Timeout => ErrorClass::Timeout,
            HostError::Kv(e) => e.class(),
            HostError::World(e) => e.class(),
            HostError::Query(e) => e.class(),
        }
    }
}

/// Errors raised synchronously into guest code.
///
/// These indicate a defect in the plugin (bad arguments) or an attempt to
/// cross the capability boundary; ordinary failures are returned as values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuestError {
    #[error("bad argument #{position} to '{function}' ({message})")]
    BadArgument {
        function: String,
        position: usize,
        message: String,
    },

    #[error("capability denied: {plugin} requires {capability}")]
    CapabilityDenied { plugin: String, capability: String },

    #[error("attempt to index unknown global '{namespace}'")]
    UnknownNamespace { namespace: String },

    #[error("attempt to call unknown function '{namespace}.{function}'")]
    UnknownFunction { namespace: String, function: String },

    /// Any other error raised by a host function.
    #[error("{0}")]
    Runtime(String),
}

/// Errors loading host configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("plugin {plugin}: {source}")]
    Grants {
        plugin: String,
        #[source]
        source: CapabilityError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(HostError::Timeout.class(), ErrorClass::Timeout);
        assert_eq!(
            HostError::from(WorldError::not_found("location")).class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            HostError::from(KvError::Backend("disk full".into())).class(),
            ErrorClass::Internal
        );

        let query = QueryError {
            plugin: "p1".into(),
            entity_type: "object",
            source: WorldError::PermissionDenied("system:plugin:p1".into()),
        };
        assert_eq!(HostError::from(query).class(), ErrorClass::AccessDenied);
    }

    #[test]
    fn test_query_error_keeps_source_text() {
        let query = QueryError {
            plugin: "p1".into(),
            entity_type: "object",
            source: WorldError::Storage("connection reset".into()),
        };
        let text = query.to_string();
        assert!(text.contains("p1"));
        assert!(text.contains("object"));
        assert!(text.contains("connection reset"));
    }
}
