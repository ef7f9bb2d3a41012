use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Weak};

/// Which of the built-in strategies a [`MutationPolicy`] follows.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PolicyKind {
	/// A change is anything that is not the very same instance.
	Reference,
	/// A change is a value whose content differs from the current one.
	Structural,
	/// Every assignment is a change.
	NeverEqual,
}

impl fmt::Display for PolicyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			PolicyKind::Reference => "ReferenceEquality",
			PolicyKind::Structural => "StructuralEquality",
			PolicyKind::NeverEqual => "NeverEqual",
		})
	}
}

/// "Same instance" as understood by [`MutationPolicy::reference`].
///
/// Values that are moved into a state have no identity of their own, so only
/// handle-like types implement this.
pub trait Identity {
	fn same_identity(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
	fn same_identity(&self, other: &Self) -> bool {
		Arc::ptr_eq(self, other)
	}
}

impl<T: ?Sized> Identity for Rc<T> {
	fn same_identity(&self, other: &Self) -> bool {
		Rc::ptr_eq(self, other)
	}
}

impl<T: ?Sized> Identity for Weak<T> {
	fn same_identity(&self, other: &Self) -> bool {
		Weak::ptr_eq(self, other)
	}
}

impl<T: ?Sized> Identity for &T {
	fn same_identity(&self, other: &Self) -> bool {
		std::ptr::eq(*self as *const T as *const (), *other as *const T as *const ())
	}
}

impl<I: Identity> Identity for Option<I> {
	fn same_identity(&self, other: &Self) -> bool {
		match (self, other) {
			(Some(a), Some(b)) => a.same_identity(b),
			(None, None) => true,
			_ => false,
		}
	}
}

/// Decides whether assigning `next` over `current` counts as a mutation.
///
/// The set of strategies is closed (see [`PolicyKind`]); the comparison each
/// one needs is captured when the policy is built, so a policy is `Copy` and
/// can be shared by any number of states.
pub struct MutationPolicy<T> {
	kind: PolicyKind,
	same: fn(&T, &T) -> bool,
	absent: fn(&T) -> bool,
}

impl<T> Clone for MutationPolicy<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for MutationPolicy<T> {}

impl<T> MutationPolicy<T> {
	pub fn reference() -> Self
	where
		T: Identity,
	{
		MutationPolicy {
			kind: PolicyKind::Reference,
			same: T::same_identity,
			absent: never_absent,
		}
	}

	/// Content comparison through `PartialEq`.
	///
	/// NOTE: when either side is absent this reports "no mutation", which
	/// also blocks transitions into and out of an absent value. Consumers
	/// rely on that, so it is kept as is.
	pub fn structural() -> Self
	where
		T: PartialEq,
	{
		MutationPolicy {
			kind: PolicyKind::Structural,
			same: T::eq,
			absent: never_absent,
		}
	}

	pub fn never_equal() -> Self {
		MutationPolicy {
			kind: PolicyKind::NeverEqual,
			same: never_same,
			absent: never_absent,
		}
	}

	pub fn kind(&self) -> PolicyKind {
		self.kind
	}

	pub fn should_mutate(&self, current: Option<&T>, next: Option<&T>) -> bool {
		let current = current.filter(|v| !(self.absent)(*v));
		let next = next.filter(|v| !(self.absent)(*v));

		match self.kind {
			PolicyKind::Reference => match (current, next) {
				(Some(current), Some(next)) => !(self.same)(current, next),
				(None, None) => false,
				_ => true,
			},
			PolicyKind::Structural => match (current, next) {
				(Some(current), Some(next)) => !(self.same)(current, next),
				_ => false,
			},
			PolicyKind::NeverEqual => true,
		}
	}
}

impl<U> MutationPolicy<Option<U>> {
	/// Structural comparison for nullable states, where `None` is the absent
	/// value and therefore subject to the structural absence rule.
	pub fn structural_nullable() -> Self
	where
		U: PartialEq,
	{
		MutationPolicy {
			kind: PolicyKind::Structural,
			same: <Option<U> as PartialEq>::eq,
			absent: Option::is_none,
		}
	}
}

impl<T: PartialEq> Default for MutationPolicy<T> {
	fn default() -> Self {
		Self::structural()
	}
}

impl<T> fmt::Debug for MutationPolicy<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.kind, f)
	}
}

impl<T> fmt::Display for MutationPolicy<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.kind, f)
	}
}

fn never_absent<T>(_: &T) -> bool {
	false
}

fn never_same<T>(_: &T, _: &T) -> bool {
	false
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn structural_compares_content() {
		let policy = MutationPolicy::<String>::structural();
		let a = String::from("a");
		assert!(!policy.should_mutate(Some(&a), Some(&"a".to_string())));
		assert!(policy.should_mutate(Some(&a), Some(&"b".to_string())));
	}

	#[test]
	fn structural_ignores_absent_sides() {
		let policy = MutationPolicy::<Option<u32>>::structural_nullable();
		assert!(!policy.should_mutate(Some(&None), Some(&Some(1))));
		assert!(!policy.should_mutate(Some(&Some(1)), Some(&None)));
		assert!(!policy.should_mutate(None, Some(&Some(1))));
		assert!(policy.should_mutate(Some(&Some(1)), Some(&Some(2))));
	}

	#[test]
	fn plain_structural_on_options_sees_none_as_a_value() {
		let policy = MutationPolicy::<Option<u32>>::structural();
		assert!(policy.should_mutate(Some(&None), Some(&Some(1))));
	}

	#[test]
	fn reference_compares_pointers() {
		let policy = MutationPolicy::<Arc<String>>::reference();
		let a = Arc::new("a".to_string());
		let b = Arc::new("a".to_string());
		assert!(!policy.should_mutate(Some(&a), Some(&a.clone())));
		assert!(policy.should_mutate(Some(&a), Some(&b)));
		assert!(policy.should_mutate(None, Some(&a)));
		assert!(!policy.should_mutate(None, None));
	}

	#[test]
	fn reference_on_rc() {
		let policy = MutationPolicy::<Rc<u8>>::reference();
		let a = Rc::new(1);
		assert!(!policy.should_mutate(Some(&a), Some(&a.clone())));
		assert!(policy.should_mutate(Some(&a), Some(&Rc::new(1))));
	}

	#[test]
	fn reference_on_weak() {
		let policy = MutationPolicy::<Weak<u8>>::reference();
		let a = Arc::new(1);
		let b = Arc::new(1);
		assert!(!policy.should_mutate(Some(&Arc::downgrade(&a)), Some(&Arc::downgrade(&a))));
		assert!(policy.should_mutate(Some(&Arc::downgrade(&a)), Some(&Arc::downgrade(&b))));
	}

	#[test]
	fn reference_on_borrows() {
		let policy = MutationPolicy::<&str>::reference();
		let a = String::from("a");
		let b = String::from("a");
		assert!(!policy.should_mutate(Some(&a.as_str()), Some(&a.as_str())));
		assert!(policy.should_mutate(Some(&a.as_str()), Some(&b.as_str())));
	}

	#[test]
	fn reference_on_optional_handles() {
		let policy = MutationPolicy::<Option<Arc<u8>>>::reference();
		let a = Arc::new(1);
		assert!(!policy.should_mutate(Some(&None), Some(&None)));
		assert!(!policy.should_mutate(Some(&Some(a.clone())), Some(&Some(a.clone()))));
		assert!(policy.should_mutate(Some(&Some(a.clone())), Some(&Some(Arc::new(1)))));
		assert!(policy.should_mutate(Some(&None), Some(&Some(a))));
	}

	#[test]
	fn never_equal_always_mutates() {
		let policy = MutationPolicy::<u8>::never_equal();
		assert!(policy.should_mutate(Some(&1), Some(&1)));
		assert!(policy.should_mutate(None, None));
		assert_eq!(policy.to_string(), "NeverEqual");
	}
}
