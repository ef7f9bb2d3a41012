use std::sync::{Arc, OnceLock};

use crate::error::FactoryError;
use crate::store::{ListenerStore, WeakOwnerStore};

/// Produces the store behind one registry.
pub type StoreFactory = Arc<dyn Fn() -> Box<dyn ListenerStore> + Send + Sync>;

static FACTORY: OnceLock<StoreFactory> = OnceLock::new();

/// Replaces the process-wide store factory.
///
/// Only possible once, and only before any registry has been built with the
/// global factory. Registries that already exist keep their stores.
pub fn set_store_factory<F>(factory: F) -> Result<(), FactoryError>
where
	F: Fn() -> Box<dyn ListenerStore> + Send + Sync + 'static,
{
	match FACTORY.set(Arc::new(factory)) {
		Ok(()) => {
			tracing::debug!("listener store factory configured");
			Ok(())
		}
		Err(_) => {
			tracing::warn!("listener store factory is already configured or in use");
			Err(FactoryError::AlreadyConfigured)
		}
	}
}

/// The process-wide factory, falling back to weak-keyed stores.
pub fn store_factory() -> StoreFactory {
	FACTORY.get_or_init(default_factory).clone()
}

pub fn create_store() -> Box<dyn ListenerStore> {
	store_factory()()
}

pub fn default_factory() -> StoreFactory {
	Arc::new(|| Box::new(WeakOwnerStore::new()) as Box<dyn ListenerStore>)
}
