//! Unified error types for the Joinery core.
//!
//! Two tiers of failure exist:
//!
//! - **Build-time** problems (bad type references, unknown assemblies,
//!   malformed registrations) are *recorded* in the
//!   [`ErrorLog`](crate::ErrorLog) under a stable [`ErrorCode`] and never
//!   returned to the caller.
//! - **Resolution-time** problems are returned as [`BuildError`], because the
//!   caller asked for an object and cannot receive one.

use thiserror::Error;

// =============================================================================
// Error Codes
// =============================================================================

/// Stable numeric codes shared by the error log and [`BuildError`].
///
/// Codes below 200 are recorded while building a plugin graph; codes from 200
/// upward belong to resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ErrorCode {
    /// An assembly name is unknown to the type registry.
    AssemblyNotFound = 101,
    /// A duplicate instance name was rejected.
    DuplicateInstanceName = 102,
    /// A family could not be configured because its contract did not resolve.
    FamilyTypeNotFound = 103,
    /// An instance cannot be plugged into the family's contract.
    CannotPlug = 104,
    /// An interceptor was declared for a different contract.
    InterceptorMismatch = 105,
    /// The designated default instance name is not present in the family.
    UnknownDefaultInstance = 106,
    /// A system object could not be constructed from its memento.
    SystemObjectFailed = 130,
    /// A type reference could not be resolved.
    TypeNotFound = 131,
    /// No instance with the requested name exists in the family.
    UnknownInstanceName = 200,
    /// The family has no default instance to fall back on.
    NoDefaultInstance = 202,
    /// A configured instance is missing a property or a property is invalid.
    PropertyFailed = 206,
    /// The construction function of an instance failed.
    ConstructionFailed = 207,
    /// No family exists for the requested contract.
    UnknownPluginType = 208,
    /// A built object does not match the requested contract.
    ContractMismatch = 209,
    /// An interceptor failed while wrapping a built object.
    InterceptionFailed = 270,
    /// A dependency cycle was detected during resolution.
    CyclicDependency = 295,
}

impl ErrorCode {
    /// Returns the numeric value of this code.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.as_u16()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

// =============================================================================
// Type Errors
// =============================================================================

/// Errors produced while resolving a [`TypeRef`](crate::TypeRef).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The textual form is empty or malformed.
    #[error("'{0}' is not a valid type reference")]
    Unparseable(String),

    /// The qualifying assembly is not registered.
    #[error("assembly '{assembly}' for type '{type_name}' could not be found")]
    AssemblyNotFound {
        /// Requested type name.
        type_name: String,
        /// Missing assembly name.
        assembly: String,
    },

    /// No registered type carries this name.
    #[error("type '{0}' could not be found")]
    NotFound(String),
}

// =============================================================================
// System Object Errors
// =============================================================================

/// Errors produced while materialising a system object from a memento.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    /// The memento does not name a concrete key.
    #[error("memento for {kind} has no concrete key")]
    MissingKey {
        /// Requested system object kind.
        kind: &'static str,
    },

    /// No constructor is registered for this kind and key.
    #[error("no {kind} is registered under '{key}'")]
    Unknown {
        /// Requested system object kind.
        kind: &'static str,
        /// Concrete key from the memento.
        key: String,
    },

    /// The constructor rejected the memento.
    #[error("could not construct {kind} '{key}': {reason}")]
    Failed {
        /// Requested system object kind.
        kind: &'static str,
        /// Concrete key from the memento.
        key: String,
        /// Reason reported by the constructor.
        reason: String,
    },
}

// =============================================================================
// Build Errors
// =============================================================================

/// Caller-facing failures returned while resolving an object.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No family is registered for the contract.
    #[error("no plugin family is registered for '{contract}'")]
    UnknownPluginType {
        /// Contract that was requested.
        contract: String,
    },

    /// The family has no instance with the requested name.
    #[error("could not find an instance named '{name}' for '{contract}'")]
    UnknownInstanceName {
        /// Contract that was requested.
        contract: String,
        /// Requested instance name.
        name: String,
    },

    /// No instance was requested by name and none can act as default.
    #[error("no default instance is defined for '{contract}' ({instances} instance(s) registered)")]
    NoDefaultInstance {
        /// Contract that was requested.
        contract: String,
        /// Number of instances in the family.
        instances: usize,
    },

    /// A configured instance requires a property that is not set.
    #[error("instance {instance} is missing property '{property}'")]
    MissingProperty {
        /// Description of the instance being built.
        instance: String,
        /// Property name.
        property: String,
    },

    /// A property value could not be converted to the requested shape.
    #[error("property '{property}' of instance {instance} is invalid: {reason}")]
    InvalidProperty {
        /// Description of the instance being built.
        instance: String,
        /// Property name.
        property: String,
        /// Conversion failure.
        reason: String,
    },

    /// The construction function of an instance failed.
    #[error("construction of instance {instance} for '{contract}' failed")]
    Construction {
        /// Contract being built.
        contract: String,
        /// Description of the instance being built.
        instance: String,
        /// Underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// A built object does not implement the requested contract.
    #[error("instance {instance} cannot be used as '{contract}'")]
    ContractMismatch {
        /// Description of the instance being built.
        instance: String,
        /// Contract that was requested.
        contract: String,
    },

    /// The concrete type of a configured instance could not be resolved.
    #[error("concrete type of instance {instance} is unresolved")]
    UnresolvedType {
        /// Description of the instance being built.
        instance: String,
        /// Underlying resolution failure.
        #[source]
        source: TypeError,
    },

    /// An interceptor failed while wrapping the built object.
    #[error("interceptor for '{contract}' failed on instance {instance}")]
    Interception {
        /// Contract being built.
        contract: String,
        /// Description of the instance being built.
        instance: String,
        /// Underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// A dependency cycle was detected.
    #[error("bidirectional dependency detected: {path}")]
    CyclicDependency {
        /// Resolution path, e.g. `Alpha('a') -> Beta('b') -> Alpha('a')`.
        path: String,
    },
}

impl BuildError {
    /// Returns the stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownPluginType { .. } => ErrorCode::UnknownPluginType,
            Self::UnknownInstanceName { .. } => ErrorCode::UnknownInstanceName,
            Self::NoDefaultInstance { .. } => ErrorCode::NoDefaultInstance,
            Self::MissingProperty { .. } | Self::InvalidProperty { .. } => {
                ErrorCode::PropertyFailed
            }
            Self::Construction { .. } => ErrorCode::ConstructionFailed,
            Self::ContractMismatch { .. } => ErrorCode::ContractMismatch,
            Self::UnresolvedType { .. } => ErrorCode::TypeNotFound,
            Self::Interception { .. } => ErrorCode::InterceptionFailed,
            Self::CyclicDependency { .. } => ErrorCode::CyclicDependency,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for type resolution.
pub type TypeResult<T> = Result<T, TypeError>;

/// Result type for system object construction.
pub type SystemResult<T> = Result<T, SystemError>;

/// Result type for object resolution.
pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorCode::AssemblyNotFound.as_u16(), 101);
        assert_eq!(ErrorCode::FamilyTypeNotFound.as_u16(), 103);
        assert_eq!(ErrorCode::SystemObjectFailed.as_u16(), 130);
        assert_eq!(ErrorCode::TypeNotFound.as_u16(), 131);
        assert_eq!(u16::from(ErrorCode::CyclicDependency), 295);
    }

    #[test]
    fn test_build_error_code() {
        let err = BuildError::UnknownInstanceName {
            contract: "Service".into(),
            name: "Blue".into(),
        };
        assert_eq!(err.code(), ErrorCode::UnknownInstanceName);
        assert_eq!(
            err.to_string(),
            "could not find an instance named 'Blue' for 'Service'"
        );
    }

    #[test]
    fn test_construction_keeps_source() {
        use std::error::Error as _;

        let err = BuildError::Construction {
            contract: "Service".into(),
            instance: "'Purple'".into(),
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.code(), ErrorCode::ConstructionFailed);
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".into()));
    }
}
