//! # Method Errors
//!
//! Every failure in registration or dispatch aborts the current operation
//! and is handed straight back to the caller. Nothing here retries.

use thiserror::Error;

/// Result type for method registry and dispatch operations
pub type MethodResult<T> = Result<T, MethodError>;

/// Method registry and dispatch errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    #[error("Unknown method `{method}` in model `{model}`")]
    UnknownMethod { model: String, method: String },

    #[error("Function signature does not match. Received: {received}, Expected: {expected}")]
    SignatureMismatch { expected: String, received: String },

    #[error("Invalid implementation: {0}")]
    InvalidImplementation(String),

    #[error("Cannot declare `{0}`: method registry is frozen")]
    RegistryFrozen(String),

    #[error("Not enough arguments when calling `{method}`: expected {expected}, got {got}")]
    ArityError {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("Argument {position} of `{method}` has type {found}, expected {expected}")]
    ArgumentTypeMismatch {
        method: String,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Return value has type {found}, expected {expected}")]
    ReturnTypeMismatch { expected: String, found: String },

    #[error("Internal error: empty call stack")]
    EmptyCallStack,

    #[error("Expected singleton, got: {0}")]
    NotASingleton(String),

    #[error("Unknown method layer: {0}")]
    UnknownLayer(String),

    #[error("Call depth limit of {limit} exceeded when calling `{method}`")]
    CallDepthExceeded { method: String, limit: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MethodError {
    /// Create an unknown method error
    pub fn unknown_method(model: impl Into<String>, method: impl Into<String>) -> Self {
        MethodError::UnknownMethod {
            model: model.into(),
            method: method.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        MethodError::Storage(msg.into())
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            MethodError::UnknownMethod { .. } => "ORM_UNKNOWN_METHOD",
            MethodError::SignatureMismatch { .. } => "ORM_SIGNATURE_MISMATCH",
            MethodError::InvalidImplementation(_) => "ORM_INVALID_IMPLEMENTATION",
            MethodError::RegistryFrozen(_) => "ORM_REGISTRY_FROZEN",
            MethodError::ArityError { .. } => "ORM_ARITY_ERROR",
            MethodError::ArgumentTypeMismatch { .. } => "ORM_ARGUMENT_TYPE_MISMATCH",
            MethodError::ReturnTypeMismatch { .. } => "ORM_RETURN_TYPE_MISMATCH",
            MethodError::EmptyCallStack => "ORM_EMPTY_CALL_STACK",
            MethodError::NotASingleton(_) => "ORM_NOT_A_SINGLETON",
            MethodError::UnknownLayer(_) => "ORM_UNKNOWN_LAYER",
            MethodError::CallDepthExceeded { .. } => "ORM_CALL_DEPTH_EXCEEDED",
            MethodError::Config(_) => "ORM_CONFIG_INVALID",
            MethodError::Storage(_) => "ORM_STORAGE_ERROR",
            MethodError::Internal(_) => "ORM_INTERNAL_ERROR",
        }
    }

    /// Returns true for conditions well-formed callers can never trigger
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            MethodError::EmptyCallStack | MethodError::UnknownLayer(_) | MethodError::Internal(_)
        )
    }
}
