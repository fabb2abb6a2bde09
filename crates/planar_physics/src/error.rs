//! Error types for binding operations
//!
//! Every Command Surface operation returns a [`PhysicsResult`]. Errors are
//! raised before any engine state is touched, so a failed call leaves the
//! World exactly as it was.

use std::fmt;

use crate::binding::WorldId;

/// Error type for physics binding operations
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Malformed or out-of-range argument (unknown body kind, negative radius, NaN...)
    Validation(String),
    /// No world with this id is registered
    WorldNotFound(WorldId),
    /// No body with this name exists in the world
    BodyNotFound(String),
    /// No fixture template with this name exists in the world
    TemplateNotFound(String),
    /// A registry entry resolved to a missing record or engine handle
    RegistryCorruption(String),
    /// The simulation engine could not be constructed
    ResourceCreation(String),
}

/// Result alias for physics binding operations
pub type PhysicsResult<T> = Result<T, PhysicsError>;

impl PhysicsError {
    /// Shorthand for a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        PhysicsError::Validation(msg.into())
    }

    /// True for errors caused by a name or id that does not resolve
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PhysicsError::WorldNotFound(_)
                | PhysicsError::BodyNotFound(_)
                | PhysicsError::TemplateNotFound(_)
        )
    }
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::Validation(msg) => write!(f, "Invalid argument: {}", msg),
            PhysicsError::WorldNotFound(id) => write!(f, "World not found: {}", id),
            PhysicsError::BodyNotFound(name) => write!(f, "Body not found: {}", name),
            PhysicsError::TemplateNotFound(name) => write!(f, "Fixture template not found: {}", name),
            PhysicsError::RegistryCorruption(msg) => write!(f, "Registry corruption: {}", msg),
            PhysicsError::ResourceCreation(msg) => write!(f, "Failed to create simulation: {}", msg),
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Reject non-finite scalars with a validation error naming the argument
pub(crate) fn check_finite(what: &str, value: f32) -> PhysicsResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PhysicsError::Validation(format!("{} must be finite, got {}", what, value)))
    }
}
