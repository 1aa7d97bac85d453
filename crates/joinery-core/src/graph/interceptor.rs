//! Interceptors applied around every build of a family.
//!
//! Enrichments wrap the built object and nest in registration order, so
//! registering `D1` then `D2` on `R` yields `D2(D1(R))`.  On-creation hooks
//! observe the fully enriched object afterwards, again in registration order.

use std::fmt;
use std::sync::Arc;

use crate::foundation::object::{ContractId, Object, downcast, erase};
use crate::foundation::types::TypeHandle;

type EnrichFn = Arc<dyn Fn(Object, &TypeHandle) -> anyhow::Result<Object> + Send + Sync>;
type HookFn = Arc<dyn Fn(&Object) -> anyhow::Result<()> + Send + Sync>;

/// A policy applied to every object built for one contract.
#[derive(Clone)]
pub enum Interceptor {
    /// Replaces the built object with a wrapping object.
    Enrichment { contract: ContractId, enrich: EnrichFn },
    /// Observes the built object after enrichment.
    OnCreation { contract: ContractId, hook: HookFn },
}

impl Interceptor {
    /// Enrichment wrapping objects of the contract `C`.
    pub fn enrich_with<C, F>(enrich: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<C> + Send + Sync + 'static,
    {
        let contract = ContractId::of::<C>();
        Self::Enrichment {
            contract,
            enrich: Arc::new(move |object: Object, _: &TypeHandle| {
                let inner = downcast::<C>(&object)
                    .ok_or_else(|| anyhow::anyhow!("built object is not a '{contract}'"))?;
                Ok(erase(enrich(inner)))
            }),
        }
    }

    /// Fallible enrichment working on erased objects.  The handle of the
    /// requested contract is passed along.
    pub fn enrich_erased<F>(contract: ContractId, enrich: F) -> Self
    where
        F: Fn(Object, &TypeHandle) -> anyhow::Result<Object> + Send + Sync + 'static,
    {
        Self::Enrichment {
            contract,
            enrich: Arc::new(enrich),
        }
    }

    /// Hook called with every newly built object of the contract `C`.
    pub fn on_creation<C, F>(hook: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&Arc<C>) + Send + Sync + 'static,
    {
        let contract = ContractId::of::<C>();
        Self::OnCreation {
            contract,
            hook: Arc::new(move |object: &Object| {
                let typed = downcast::<C>(object)
                    .ok_or_else(|| anyhow::anyhow!("built object is not a '{contract}'"))?;
                hook(&typed);
                Ok(())
            }),
        }
    }

    /// Contract this interceptor was declared for.
    pub fn contract(&self) -> ContractId {
        match self {
            Self::Enrichment { contract, .. } | Self::OnCreation { contract, .. } => *contract,
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enrichment { contract, .. } => write!(f, "Enrichment({contract})"),
            Self::OnCreation { contract, .. } => write!(f, "OnCreation({contract})"),
        }
    }
}

/// Ordered interceptors of one family.
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Interceptor>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Interceptor) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interceptor> {
        self.interceptors.iter()
    }

    /// Runs every enrichment, then every hook, both in registration order.
    pub fn apply(&self, object: Object, contract: &TypeHandle) -> anyhow::Result<Object> {
        let mut object = object;
        for interceptor in &self.interceptors {
            if let Interceptor::Enrichment { enrich, .. } = interceptor {
                object = enrich(object, contract)?;
            }
        }
        for interceptor in &self.interceptors {
            if let Interceptor::OnCreation { hook, .. } = interceptor {
                hook(&object)?;
            }
        }
        Ok(object)
    }
}
