use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Type-erased, weakly held owner of a listener registration.
///
/// Two owners are equal when they point at the same allocation. The weak
/// handle keeps that allocation reserved, so the address stays unique for as
/// long as an `Owner` refers to it.
#[derive(Clone)]
pub struct Owner {
	ptr: Weak<dyn Any + Send + Sync>,
}

impl Owner {
	pub fn of<O>(owner: &Arc<O>) -> Self
	where
		O: Any + Send + Sync,
	{
		let weak: Weak<O> = Arc::downgrade(owner);
		let ptr: Weak<dyn Any + Send + Sync> = weak;
		Owner { ptr }
	}

	pub fn is_alive(&self) -> bool {
		self.ptr.strong_count() > 0
	}

	pub fn addr(&self) -> usize {
		Weak::as_ptr(&self.ptr) as *const () as usize
	}
}

impl PartialEq for Owner {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl Eq for Owner {}

impl Hash for Owner {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_usize(self.addr());
	}
}

impl std::fmt::Debug for Owner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Owner")
			.field("addr", &format_args!("{:#x}", self.addr()))
			.field("alive", &self.is_alive())
			.finish()
	}
}
