//! Link-time assembly registration.
//!
//! Crates contribute assemblies without any central list: each contribution is
//! an [`AssemblyDescriptor`] placed in the [`ASSEMBLIES`] distributed slice,
//! usually through the `#[assembly("name")]` attribute.
//! [`TypeRegistry::linked`](super::types::TypeRegistry::linked) collects them.

use linkme::distributed_slice;

use super::types::AssemblyBuilder;

/// Function that registers the types of one assembly.
pub type RegisterFn = fn(&mut AssemblyBuilder);

/// One link-time assembly contribution.
#[derive(Clone, Copy)]
pub struct AssemblyDescriptor {
    /// Assembly name used in `Name,assembly` type references.
    pub name: &'static str,
    /// Registers the assembly's contracts and concrete types.
    pub register: RegisterFn,
}

impl std::fmt::Debug for AssemblyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registry of assemblies contributed at link time.
#[distributed_slice]
pub static ASSEMBLIES: [AssemblyDescriptor];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::types::{TypeRef, TypeRegistry};

    trait Sensor: Send + Sync {}

    fn register_sensors(asm: &mut AssemblyBuilder) {
        asm.contract::<dyn Sensor>("Sensor");
    }

    #[distributed_slice(ASSEMBLIES)]
    static SENSOR_ASSEMBLY: AssemblyDescriptor = AssemblyDescriptor {
        name: "sensors",
        register: register_sensors,
    };

    #[test]
    fn test_linked_registry_collects_contributions() {
        let types = TypeRegistry::linked();
        assert!(types.has_assembly("sensors"));
        assert_eq!(TypeRef::new("Sensor,sensors").resolve(&types).unwrap().name(), "Sensor");
    }
}
