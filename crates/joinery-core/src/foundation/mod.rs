//! Foundation layer - type identities, type registry and the error log.
//!
//! - Type-erased objects and contract identities ([`Object`], [`ContractId`])
//! - Lazily resolved type references ([`TypeRef`]) against an explicit
//!   [`TypeRegistry`]
//! - The append-only build-time [`ErrorLog`]

pub mod linked;
pub mod log;
pub mod object;
pub mod types;

pub use linked::{ASSEMBLIES, AssemblyDescriptor, RegisterFn};
pub use log::{ErrorLog, LogEntry};
pub use object::{ContractId, Object, downcast, erase};
pub use types::{
    AssemblyBuilder, ConcreteRegistration, Constructor, RawObject, TypeHandle, TypeRef,
    TypeRegistry,
};
