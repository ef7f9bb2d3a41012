#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use mockall::*;

#[automock]
pub trait Spy {
	fn fire(&self, tag: u32);
}

#[derive(Clone)]
pub struct SharedMock(Arc<Mutex<MockSpy>>);

impl SharedMock {
	pub fn new() -> SharedMock {
		SharedMock(Arc::new(Mutex::new(MockSpy::new())))
	}

	pub fn get<'a>(&'a self) -> MutexGuard<'a, MockSpy> {
		return self.0.lock().unwrap();
	}

	/// A listener reporting `tag` to this mock.
	pub fn listener(&self, tag: u32) -> impl Fn() + Send + Sync + 'static {
		let mock = self.clone();
		move || mock.get().fire(tag)
	}
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::TRACE)
		.with_test_writer()
		.try_init();
}
