use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use watchable::{
	set_store_factory, FactoryError, ListenerStore, MutableState, Notifier, State, WeakOwnerStore,
};

static CREATED: AtomicUsize = AtomicUsize::new(0);

// The factory is process-wide, so everything touching it lives in this one
// test binary and in this one test.
#[test]
fn global_factory_is_configured_once() {
	set_store_factory(|| {
		CREATED.fetch_add(1, Ordering::SeqCst);
		Box::new(WeakOwnerStore::new()) as Box<dyn ListenerStore>
	})
	.unwrap();

	assert_eq!(
		set_store_factory(|| Box::new(WeakOwnerStore::new()) as Box<dyn ListenerStore>),
		Err(FactoryError::AlreadyConfigured)
	);

	let owner = Arc::new(());
	let state = MutableState::new(1);
	let notifier = Notifier::new();
	assert_eq!(CREATED.load(Ordering::SeqCst), 2);

	let hits = Arc::new(AtomicUsize::new(0));
	state.add_listener(&owner, {
		let hits = hits.clone();
		move || {
			hits.fetch_add(1, Ordering::SeqCst);
		}
	});
	notifier.add_listener(&owner, || {});

	state.set(2);
	assert_eq!(hits.load(Ordering::SeqCst), 1);
	assert_eq!(notifier.registry().listener_count(), 1);
}
