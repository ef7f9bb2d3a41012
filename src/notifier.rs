use std::sync::Arc;

use crate::registry::ListenerRegistry;
use crate::State;

/// A state without a value: it can only be listened to and triggered.
#[derive(Clone, Default, Debug)]
pub struct Notifier {
	registry: Arc<ListenerRegistry>,
}

impl Notifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_registry(registry: ListenerRegistry) -> Self {
		Notifier {
			registry: Arc::new(registry),
		}
	}
}

impl State for Notifier {
	fn registry(&self) -> &ListenerRegistry {
		&self.registry
	}
}
