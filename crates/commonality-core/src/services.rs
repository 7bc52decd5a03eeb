//! Explicit service context.
//!
//! A typed registry of shared services (clock, logger, settings, ...).
//! It is created at startup and handed to the constructors that need it;
//! nothing reaches for it implicitly.
//!
//! ```ignore
//! let services = ServiceContext::new();
//! services.set::<dyn Clock>(Arc::new(SystemClock));
//!
//! let logger = SessionLogger::builder(store).services(&services).build();
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};

/// Registry of shared services keyed by type (usually a trait object type).
#[derive(Default)]
pub struct ServiceContext {
    services: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ServiceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the current implementation of `T`, replacing any previous one.
    pub fn set<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .write()
            .insert(TypeId::of::<T>(), Box::new(service));
    }

    /// Get the current implementation of `T`.
    ///
    /// Asking for a service that was never registered is a wiring defect
    /// and fails with [`CoreError::ServiceNotFound`].
    pub fn get<T>(&self) -> CoreResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_get::<T>()
            .ok_or(CoreError::ServiceNotFound(type_name::<T>()))
    }

    /// Get the current implementation of `T`, if one is registered.
    pub fn try_get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|service| service.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services.read().contains_key(&TypeId::of::<T>())
    }

    /// Remove every registered service.
    pub fn clear(&self) {
        self.services.write().clear();
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("services", &self.services.read().len())
            .finish()
    }
}
