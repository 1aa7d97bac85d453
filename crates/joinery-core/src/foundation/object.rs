//! Type-erased objects and contract identities.
//!
//! Built objects travel through the engine as [`Object`]: an
//! `Arc<dyn Any + Send + Sync>` whose payload is itself an `Arc<C>` for the
//! contract `C` the object was built for.  `C` is usually a trait object
//! (`dyn Service`), so the double `Arc` is what lets an unsized contract be
//! recovered with a plain `downcast_ref::<Arc<C>>()`.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A built object, erased to `Any`.  The payload is an `Arc<C>`.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Wraps a typed contract object into an [`Object`].
pub fn erase<C: ?Sized + Send + Sync + 'static>(value: Arc<C>) -> Object {
    Arc::new(value)
}

/// Recovers the typed contract object from an [`Object`].
///
/// Returns `None` if the object was built for a different contract.
pub fn downcast<C: ?Sized + Send + Sync + 'static>(object: &Object) -> Option<Arc<C>> {
    object.downcast_ref::<Arc<C>>().map(Arc::clone)
}

/// Identity of a contract type: its `TypeId` plus a printable name.
///
/// Equality and hashing only consider the `TypeId`.
#[derive(Clone, Copy)]
pub struct ContractId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ContractId {
    /// Identity of the contract `C`.
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name, e.g. `dyn my_crate::Service`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ContractId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ContractId {}

impl Hash for ContractId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
