use std::any::Any;
use std::fmt;

use thiserror::Error;

/// A listener that panicked while a state was being triggered.
pub struct ListenerFailure {
	message: String,
	payload: Box<dyn Any + Send>,
}

impl ListenerFailure {
	pub(crate) fn new(payload: Box<dyn Any + Send>) -> Self {
		let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
			(*message).to_owned()
		} else if let Some(message) = payload.downcast_ref::<String>() {
			message.clone()
		} else {
			String::from("<non-string panic payload>")
		};

		ListenerFailure { message, payload }
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn into_payload(self) -> Box<dyn Any + Send> {
		self.payload
	}
}

impl fmt::Debug for ListenerFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerFailure")
			.field("message", &self.message)
			.finish()
	}
}

/// Every other listener still ran; these are the ones that did not finish.
#[derive(Debug, Error)]
#[error("{} listener(s) panicked during trigger: {}", .failures.len(), summary(.failures))]
pub struct TriggerError {
	failures: Vec<ListenerFailure>,
}

impl TriggerError {
	pub(crate) fn new(failures: Vec<ListenerFailure>) -> Self {
		TriggerError { failures }
	}

	pub fn failures(&self) -> &[ListenerFailure] {
		&self.failures
	}

	/// Re-raises the first listener panic on the current thread.
	pub fn resume(self) -> ! {
		match self.failures.into_iter().next() {
			Some(failure) => std::panic::resume_unwind(failure.into_payload()),
			None => panic!("trigger failed without a listener failure"),
		}
	}
}

fn summary(failures: &[ListenerFailure]) -> String {
	failures
		.iter()
		.map(ListenerFailure::message)
		.collect::<Vec<_>>()
		.join("; ")
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum CollectionError {
	#[error("index {index} is out of bounds for length {len}")]
	IndexOutOfBounds { index: usize, len: usize },
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum FactoryError {
	#[error("the listener store factory is already configured or in use")]
	AlreadyConfigured,
}
