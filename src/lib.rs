//! Change notification for stateful values and collections.
//!
//! A [`MutableState`] holds a value and a [`MutationPolicy`] deciding which
//! assignments are real changes; [`ListState`] and [`MapState`] wrap a backing
//! container and notify on writes that change it. Listeners are registered
//! against an owner and live only as long as that owner does.

pub mod macros;

mod addr;
mod error;
mod factory;
mod list;
mod map;
mod mutable;
mod notifier;
mod policy;
mod registry;
mod store;

use std::any::Any;
use std::sync::Arc;

pub use addr::Owner;
pub use error::{CollectionError, FactoryError, ListenerFailure, TriggerError};
pub use factory::{create_store, default_factory, set_store_factory, store_factory, StoreFactory};
pub use list::{ListBacking, ListState};
pub use map::{MapBacking, MapState};
pub use mutable::MutableState;
pub use notifier::Notifier;
pub use policy::{Identity, MutationPolicy, PolicyKind};
pub use registry::ListenerRegistry;
pub use store::{Listener, ListenerStore, WeakOwnerStore};

/// Anything that can announce a change to its listeners.
pub trait State: Send + Sync {
	fn registry(&self) -> &ListenerRegistry;

	/// Synchronously runs every live listener.
	fn trigger(&self) -> Result<(), TriggerError> {
		self.registry().trigger_all()
	}

	/// Registers `listener` for as long as `owner` is alive.
	fn add_listener<O, F>(&self, owner: &Arc<O>, listener: F)
	where
		Self: Sized,
		O: Any + Send + Sync,
		F: Fn() + Send + Sync + 'static,
	{
		self.registry().add_listener(owner, listener)
	}
}
