use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::policy::MutationPolicy;
use crate::registry::ListenerRegistry;
use crate::State;

/// A value whose accepted changes are announced to its listeners.
///
/// Clones are handles to the same value and the same listeners.
pub struct MutableState<T> {
	body: Arc<MutableStateBody<T>>,
}

struct MutableStateBody<T> {
	value: RwLock<T>,
	policy: MutationPolicy<T>,
	registry: ListenerRegistry,
}

impl<T> Clone for MutableState<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> MutableState<T> {
	/// A state using structural equality.
	pub fn new(value: T) -> Self
	where
		T: PartialEq,
	{
		Self::with_policy(value, MutationPolicy::structural())
	}

	pub fn with_policy(value: T, policy: MutationPolicy<T>) -> Self {
		Self::with_registry(value, policy, ListenerRegistry::new())
	}

	pub fn with_registry(value: T, policy: MutationPolicy<T>, registry: ListenerRegistry) -> Self {
		MutableState {
			body: Arc::new(MutableStateBody {
				value: RwLock::new(value),
				policy,
				registry,
			}),
		}
	}

	#[inline]
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.body.value.read().clone()
	}

	#[inline]
	pub fn read(&self) -> RwLockReadGuard<'_, T> {
		self.body.value.read()
	}

	#[inline]
	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		func(&*self.body.value.read())
	}

	pub fn policy(&self) -> MutationPolicy<T> {
		self.body.policy
	}

	/// Replaces the value if the policy sees a change, then runs every
	/// listener. Returns whether the value was replaced.
	///
	/// A listener panic is re-raised here once all listeners have run; the
	/// new value stays in place.
	pub fn set(&self, next: T) -> bool {
		let previous = {
			let mut value = self.body.value.write();
			if !self.body.policy.should_mutate(Some(&*value), Some(&next)) {
				None
			} else {
				Some(std::mem::replace(&mut *value, next))
			}
		};

		self.settle(previous)
	}

	/// Applies `func` to the current value and sets the result, returning
	/// whatever the state holds afterwards: the new value when accepted, the
	/// untouched one otherwise.
	///
	/// `func` runs under the state's write lock and must not touch this state.
	pub fn update(&self, func: impl FnOnce(&T) -> T) -> T
	where
		T: Clone,
	{
		let (previous, current) = {
			let mut value = self.body.value.write();
			let next = func(&*value);
			let previous = if self.body.policy.should_mutate(Some(&*value), Some(&next)) {
				Some(std::mem::replace(&mut *value, next))
			} else {
				None
			};
			(previous, value.clone())
		};

		self.settle(previous);
		current
	}

	fn settle(&self, previous: Option<T>) -> bool {
		match previous {
			Some(previous) => {
				drop(previous);
				self.body.registry.notify();
				true
			}
			None => {
				tracing::trace!(policy = %self.body.policy, "mutation rejected");
				false
			}
		}
	}
}

impl<U> MutableState<Option<U>> {
	/// A state that may hold no value, compared structurally with `None`
	/// treated as absent.
	pub fn nullable(value: Option<U>) -> Self
	where
		U: PartialEq,
	{
		Self::with_policy(value, MutationPolicy::structural_nullable())
	}
}

impl<T> State for MutableState<T>
where
	T: Send + Sync,
{
	fn registry(&self) -> &ListenerRegistry {
		&self.body.registry
	}
}

impl<T> Default for MutableState<T>
where
	T: Default + PartialEq,
{
	fn default() -> Self {
		MutableState::new(Default::default())
	}
}

impl<T> From<T> for MutableState<T>
where
	T: PartialEq,
{
	fn from(value: T) -> Self {
		MutableState::new(value)
	}
}

impl<T> PartialEq for MutableState<T>
where
	T: PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		if Arc::ptr_eq(&self.body, &other.body) {
			return true;
		}

		// Fair locks: always read-lock in address order, so `a == b` and
		// `b == a` cannot each hold one lock while a writer waits on the other.
		let (lhs, rhs) = if Arc::as_ptr(&self.body) < Arc::as_ptr(&other.body) {
			let lhs = self.read();
			(lhs, other.read())
		} else {
			let rhs = other.read();
			(self.read(), rhs)
		};
		*lhs == *rhs
	}
}

impl<T> Eq for MutableState<T> where T: Eq {}

impl<T> Hash for MutableState<T>
where
	T: Hash,
{
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.read().hash(state);
	}
}

impl<T> Debug for MutableState<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MutableState")
			.field("value", &*self.read())
			.field("policy", &self.body.policy)
			.finish()
	}
}
