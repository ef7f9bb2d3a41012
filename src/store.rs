use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::addr::Owner;

/// A callback registered against a state.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// The associative structure behind a [`ListenerRegistry`](crate::ListenerRegistry).
///
/// Implementations must hold owners weakly: an owner that is dropped
/// everywhere else has to stop receiving callbacks. Nothing checks this.
pub trait ListenerStore: Send + Sync {
	/// Appends `listener` to the end of the owner's callbacks, creating the
	/// owner's entry when it is missing.
	fn insert(&self, owner: Owner, listener: Listener);

	/// Callbacks of every live owner, each owner's in registration order.
	fn snapshot(&self) -> Vec<Listener>;

	/// Drops entries whose owner is gone and returns how many were removed.
	fn purge(&self) -> usize;

	fn owner_count(&self) -> usize;

	fn listener_count(&self) -> usize;
}

type Listeners = SmallVec<[Listener; 2]>;

/// Default store: a weak-keyed hash map from owner to its callbacks.
#[derive(Default)]
pub struct WeakOwnerStore {
	entries: RwLock<FxHashMap<Owner, Listeners>>,
}

impl WeakOwnerStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ListenerStore for WeakOwnerStore {
	fn insert(&self, owner: Owner, listener: Listener) {
		let mut stale = Vec::new();
		{
			let mut entries = self.entries.write();
			if !entries.contains_key(&owner) {
				stale = take_stale(&mut entries);
			}
			entries.entry(owner).or_default().push(listener);
		}

		if !stale.is_empty() {
			tracing::debug!(count = stale.len(), "reclaimed listeners of dropped owners");
		}
	}

	fn snapshot(&self) -> Vec<Listener> {
		let mut listeners = Vec::new();
		let mut has_stale = false;
		{
			let entries = self.entries.read();
			for (owner, callbacks) in entries.iter() {
				if owner.is_alive() {
					listeners.extend(callbacks.iter().cloned());
				} else {
					has_stale = true;
				}
			}
		}

		if has_stale {
			self.purge();
		}

		listeners
	}

	fn purge(&self) -> usize {
		// Callbacks are dropped after the lock is released, their captures
		// may touch this store again.
		let stale = take_stale(&mut self.entries.write());
		if !stale.is_empty() {
			tracing::debug!(count = stale.len(), "reclaimed listeners of dropped owners");
		}
		stale.len()
	}

	fn owner_count(&self) -> usize {
		self.entries
			.read()
			.keys()
			.filter(|owner| owner.is_alive())
			.count()
	}

	fn listener_count(&self) -> usize {
		self.entries
			.read()
			.iter()
			.filter(|(owner, _)| owner.is_alive())
			.map(|(_, callbacks)| callbacks.len())
			.sum()
	}
}

fn take_stale(entries: &mut FxHashMap<Owner, Listeners>) -> Vec<(Owner, Listeners)> {
	let dead: Vec<Owner> = entries
		.keys()
		.filter(|owner| !owner.is_alive())
		.cloned()
		.collect();

	dead.into_iter()
		.filter_map(|owner| entries.remove_entry(&owner))
		.collect()
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	fn counter(hits: &Arc<AtomicUsize>) -> Listener {
		let hits = hits.clone();
		Arc::new(move || {
			hits.fetch_add(1, Ordering::SeqCst);
		})
	}

	#[test]
	fn keeps_owner_entries_apart() {
		let store = WeakOwnerStore::new();
		let a = Arc::new(1u8);
		let b = Arc::new(2u8);
		let hits = Arc::new(AtomicUsize::new(0));

		store.insert(Owner::of(&a), counter(&hits));
		store.insert(Owner::of(&a), counter(&hits));
		store.insert(Owner::of(&b), counter(&hits));

		assert_eq!(store.owner_count(), 2);
		assert_eq!(store.listener_count(), 3);
		assert_eq!(store.snapshot().len(), 3);
	}

	#[test]
	fn purge_removes_dropped_owners() {
		let store = WeakOwnerStore::new();
		let kept = Arc::new(());
		let dropped = Arc::new(());
		let hits = Arc::new(AtomicUsize::new(0));

		store.insert(Owner::of(&kept), counter(&hits));
		store.insert(Owner::of(&dropped), counter(&hits));
		drop(dropped);

		assert_eq!(store.owner_count(), 1);
		assert_eq!(store.purge(), 1);
		assert_eq!(store.purge(), 0);
		assert_eq!(store.entries.read().len(), 1);
	}

	#[test]
	fn snapshot_skips_and_reclaims_dropped_owners() {
		let store = WeakOwnerStore::new();
		let dropped = Arc::new(());
		let hits = Arc::new(AtomicUsize::new(0));

		store.insert(Owner::of(&dropped), counter(&hits));
		drop(dropped);

		assert!(store.snapshot().is_empty());
		assert!(store.entries.read().is_empty());
	}
}
