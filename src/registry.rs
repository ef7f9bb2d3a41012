use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::addr::Owner;
use crate::error::{ListenerFailure, TriggerError};
use crate::factory::{create_store, StoreFactory};
use crate::store::{Listener, ListenerStore};

/// Owner-scoped listeners of one state.
///
/// Owners are held weakly. Once every strong handle to an owner is dropped
/// its callbacks stop firing and its entry is reclaimed on the next pass, so
/// there is nothing to unsubscribe. A callback that captures a strong handle
/// to its own owner keeps that owner alive for as long as the registry lives.
pub struct ListenerRegistry {
	store: Box<dyn ListenerStore>,
}

impl ListenerRegistry {
	/// A registry backed by the process-wide store factory.
	pub fn new() -> Self {
		Self::with_store(create_store())
	}

	pub fn with_store(store: Box<dyn ListenerStore>) -> Self {
		ListenerRegistry { store }
	}

	pub fn with_factory(factory: &StoreFactory) -> Self {
		Self::with_store(factory())
	}

	pub fn add_listener<O, F>(&self, owner: &Arc<O>, listener: F)
	where
		O: Any + Send + Sync,
		F: Fn() + Send + Sync + 'static,
	{
		self.add_shared_listener(Owner::of(owner), Arc::new(listener));
	}

	pub fn add_shared_listener(&self, owner: Owner, listener: Listener) {
		self.store.insert(owner, listener);
	}

	/// Runs every callback of every live owner on the current thread.
	///
	/// Works on a snapshot: owners registered while this runs may be missed,
	/// and no lock is held while callbacks run. A panicking callback does not
	/// stop the others; all panics are returned together.
	pub fn trigger_all(&self) -> Result<(), TriggerError> {
		let listeners = self.store.snapshot();
		tracing::trace!(listeners = listeners.len(), "trigger");

		let mut failures = Vec::new();
		for listener in listeners {
			if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener())) {
				let failure = ListenerFailure::new(payload);
				tracing::error!(message = failure.message(), "listener panicked");
				failures.push(failure);
			}
		}

		if failures.is_empty() {
			Ok(())
		} else {
			Err(TriggerError::new(failures))
		}
	}

	/// Triggers and re-raises the first listener panic, if any, after the
	/// whole fan-out has run.
	pub(crate) fn notify(&self) {
		if let Err(error) = self.trigger_all() {
			error.resume()
		}
	}

	pub fn purge(&self) -> usize {
		self.store.purge()
	}

	pub fn owner_count(&self) -> usize {
		self.store.owner_count()
	}

	pub fn listener_count(&self) -> usize {
		self.store.listener_count()
	}
}

impl Default for ListenerRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ListenerRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerRegistry")
			.field("owners", &self.owner_count())
			.field("listeners", &self.listener_count())
			.finish()
	}
}
