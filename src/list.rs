use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::error::CollectionError;
use crate::registry::ListenerRegistry;
use crate::State;

/// An ordered, random-access sequence a [`ListState`] can observe.
///
/// Indices handed to the mutating methods are always in bounds.
pub trait ListBacking<T> {
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get(&self, index: usize) -> Option<&T>;

	fn get_mut(&mut self, index: usize) -> Option<&mut T>;

	fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_>;

	fn push(&mut self, value: T);

	fn insert(&mut self, index: usize, value: T);

	fn insert_many(&mut self, index: usize, values: Vec<T>) {
		for (offset, value) in values.into_iter().enumerate() {
			self.insert(index + offset, value);
		}
	}

	fn remove(&mut self, index: usize) -> T;

	fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&T) -> bool;

	fn clear(&mut self);
}

impl<T> ListBacking<T> for Vec<T> {
	fn len(&self) -> usize {
		Vec::len(self)
	}

	fn get(&self, index: usize) -> Option<&T> {
		<[T]>::get(self, index)
	}

	fn get_mut(&mut self, index: usize) -> Option<&mut T> {
		<[T]>::get_mut(self, index)
	}

	fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
		Box::new(<[T]>::iter(self))
	}

	fn push(&mut self, value: T) {
		Vec::push(self, value)
	}

	fn insert(&mut self, index: usize, value: T) {
		Vec::insert(self, index, value)
	}

	fn insert_many(&mut self, index: usize, values: Vec<T>) {
		// Nothing is replaced, the spliced-out iterator is empty.
		self.splice(index..index, values).for_each(drop);
	}

	fn remove(&mut self, index: usize) -> T {
		Vec::remove(self, index)
	}

	fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&T) -> bool,
	{
		Vec::retain(self, keep)
	}

	fn clear(&mut self) {
		Vec::clear(self)
	}
}

impl<T> ListBacking<T> for VecDeque<T> {
	fn len(&self) -> usize {
		VecDeque::len(self)
	}

	fn get(&self, index: usize) -> Option<&T> {
		VecDeque::get(self, index)
	}

	fn get_mut(&mut self, index: usize) -> Option<&mut T> {
		VecDeque::get_mut(self, index)
	}

	fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
		Box::new(VecDeque::iter(self))
	}

	fn push(&mut self, value: T) {
		self.push_back(value)
	}

	fn insert(&mut self, index: usize, value: T) {
		VecDeque::insert(self, index, value)
	}

	fn remove(&mut self, index: usize) -> T {
		let len = VecDeque::len(self);
		match VecDeque::remove(self, index) {
			Some(value) => value,
			None => panic!("removal index (is {index}) should be < len (is {len})"),
		}
	}

	fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&T) -> bool,
	{
		VecDeque::retain(self, keep)
	}

	fn clear(&mut self) {
		VecDeque::clear(self)
	}
}

/// An observable list.
///
/// Reads go straight to the backing sequence. Writes apply to it first and
/// then trigger, but only when the contents actually changed: appends,
/// indexed writes and `clear` always count; removals and bulk operations
/// count when they added or removed something.
///
/// Out-of-range indices panic like the equivalent `Vec` call (the `try_`
/// variants return [`CollectionError`] instead); neither triggers.
pub struct ListState<T, B = Vec<T>> {
	body: Arc<ListBody<T, B>>,
}

struct ListBody<T, B> {
	backing: RwLock<B>,
	registry: ListenerRegistry,
	_item: PhantomData<fn() -> T>,
}

impl<T, B> Clone for ListState<T, B> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> ListState<T> {
	pub fn new() -> Self {
		Self::from_backing(Vec::new())
	}
}

impl<T, B> ListState<T, B>
where
	B: ListBacking<T>,
{
	pub fn from_backing(backing: B) -> Self {
		Self::with_registry(backing, ListenerRegistry::new())
	}

	pub fn with_registry(backing: B, registry: ListenerRegistry) -> Self {
		ListState {
			body: Arc::new(ListBody {
				backing: RwLock::new(backing),
				registry,
				_item: PhantomData,
			}),
		}
	}

	/// Runs `func` with write access to the backing sequence and triggers
	/// afterwards if `changed` says so.
	fn write<R>(&self, func: impl FnOnce(&mut B) -> R, changed: impl FnOnce(&R) -> bool) -> R {
		let result = func(&mut *self.body.backing.write());
		if changed(&result) {
			self.body.registry.notify();
		}
		result
	}

	fn check_index(&self, backing: &B, index: usize, inclusive: bool) -> Result<(), CollectionError> {
		let len = backing.len();
		if index < len || (inclusive && index == len) {
			Ok(())
		} else {
			Err(CollectionError::IndexOutOfBounds { index, len })
		}
	}

	// Reads

	pub fn len(&self) -> usize {
		self.body.backing.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.body.backing.read().is_empty()
	}

	pub fn get(&self, index: usize) -> Option<MappedRwLockReadGuard<'_, T>> {
		RwLockReadGuard::try_map(self.body.backing.read(), |backing| backing.get(index)).ok()
	}

	pub fn get_cloned(&self, index: usize) -> Option<T>
	where
		T: Clone,
	{
		self.body.backing.read().get(index).cloned()
	}

	pub fn first(&self) -> Option<T>
	where
		T: Clone,
	{
		self.get_cloned(0)
	}

	pub fn last(&self) -> Option<T>
	where
		T: Clone,
	{
		let backing = self.body.backing.read();
		backing.len().checked_sub(1).and_then(|index| backing.get(index)).cloned()
	}

	pub fn contains(&self, value: &T) -> bool
	where
		T: PartialEq,
	{
		self.body.backing.read().iter().any(|item| item == value)
	}

	pub fn contains_all(&self, values: &[T]) -> bool
	where
		T: PartialEq,
	{
		let backing = self.body.backing.read();
		values
			.iter()
			.all(|value| backing.iter().any(|item| item == value))
	}

	pub fn index_of(&self, value: &T) -> Option<usize>
	where
		T: PartialEq,
	{
		self.body.backing.read().iter().position(|item| item == value)
	}

	pub fn last_index_of(&self, value: &T) -> Option<usize>
	where
		T: PartialEq,
	{
		self.body
			.backing
			.read()
			.iter()
			.enumerate()
			.filter(|(_, item)| *item == value)
			.map(|(index, _)| index)
			.last()
	}

	pub fn to_vec(&self) -> Vec<T>
	where
		T: Clone,
	{
		self.body.backing.read().iter().cloned().collect()
	}

	/// Copies the elements in `range`. Panics like slicing a `Vec` would when
	/// the range is out of bounds.
	pub fn slice(&self, range: Range<usize>) -> Vec<T>
	where
		T: Clone,
	{
		let backing = self.body.backing.read();
		let len = backing.len();
		if range.start > range.end {
			panic!("slice index starts at {} but ends at {}", range.start, range.end);
		}
		if range.end > len {
			panic!("range end index {} out of range for slice of length {len}", range.end);
		}
		backing
			.iter()
			.skip(range.start)
			.take(range.end - range.start)
			.cloned()
			.collect()
	}

	/// Read access to the backing sequence. Writers block until the guard is
	/// dropped.
	pub fn read(&self) -> RwLockReadGuard<'_, B> {
		self.body.backing.read()
	}

	pub fn with<R>(&self, func: impl FnOnce(&B) -> R) -> R {
		func(&*self.body.backing.read())
	}

	// Writes

	/// Appends `value`. Always triggers.
	pub fn push(&self, value: T) {
		self.write(|backing| backing.push(value), |_| true)
	}

	pub fn insert(&self, index: usize, value: T) {
		if let Err(error) = self.try_insert(index, value) {
			panic!("insertion failed: {error}")
		}
	}

	pub fn try_insert(&self, index: usize, value: T) -> Result<(), CollectionError> {
		self.write(
			|backing: &mut B| -> Result<(), CollectionError> {
				self.check_index(backing, index, true)?;
				backing.insert(index, value);
				Ok(())
			},
			Result::is_ok,
		)
	}

	/// Replaces the element at `index`, returning the previous one.
	pub fn set(&self, index: usize, value: T) -> T {
		match self.try_set(index, value) {
			Ok(previous) => previous,
			Err(error) => panic!("replacement failed: {error}"),
		}
	}

	pub fn try_set(&self, index: usize, value: T) -> Result<T, CollectionError> {
		self.write(
			|backing| {
				let len = backing.len();
				match backing.get_mut(index) {
					Some(slot) => Ok(std::mem::replace(slot, value)),
					None => Err(CollectionError::IndexOutOfBounds { index, len }),
				}
			},
			Result::is_ok,
		)
	}

	pub fn remove(&self, index: usize) -> T {
		match self.try_remove(index) {
			Ok(removed) => removed,
			Err(error) => panic!("removal failed: {error}"),
		}
	}

	pub fn try_remove(&self, index: usize) -> Result<T, CollectionError> {
		self.write(
			|backing: &mut B| -> Result<T, CollectionError> {
				self.check_index(backing, index, false)?;
				Ok(backing.remove(index))
			},
			Result::is_ok,
		)
	}

	/// Removes the first element equal to `value`. Triggers only when one was
	/// found.
	pub fn remove_item(&self, value: &T) -> bool
	where
		T: PartialEq,
	{
		self.write(
			|backing| {
				let found = backing.iter().position(|item| item == value);
				match found {
					Some(index) => {
						backing.remove(index);
						true
					}
					None => false,
				}
			},
			|removed| *removed,
		)
	}

	/// Appends every element of `values`. Triggers when at least one was
	/// added.
	pub fn extend(&self, values: impl IntoIterator<Item = T>) -> bool {
		self.write(
			|backing| {
				let before = backing.len();
				for value in values {
					backing.push(value);
				}
				backing.len() != before
			},
			|added| *added,
		)
	}

	pub fn insert_all(&self, index: usize, values: impl IntoIterator<Item = T>) -> bool {
		match self.try_insert_all(index, values) {
			Ok(added) => added,
			Err(error) => panic!("insertion failed: {error}"),
		}
	}

	pub fn try_insert_all(
		&self,
		index: usize,
		values: impl IntoIterator<Item = T>,
	) -> Result<bool, CollectionError> {
		self.write(
			|backing: &mut B| -> Result<bool, CollectionError> {
				self.check_index(backing, index, true)?;
				let values: Vec<T> = values.into_iter().collect();
				let added = !values.is_empty();
				if added {
					backing.insert_many(index, values);
				}
				Ok(added)
			},
			|result| matches!(result, Ok(true)),
		)
	}

	/// Removes every element contained in `values`.
	pub fn remove_all(&self, values: &[T]) -> bool
	where
		T: PartialEq,
	{
		self.retain(|item| !values.contains(item))
	}

	/// Keeps only the elements contained in `values`.
	pub fn retain_all(&self, values: &[T]) -> bool
	where
		T: PartialEq,
	{
		self.retain(|item| values.contains(item))
	}

	/// Keeps the elements `keep` accepts. Triggers when anything was removed.
	pub fn retain(&self, keep: impl FnMut(&T) -> bool) -> bool {
		self.write(
			|backing| {
				let before = backing.len();
				backing.retain(keep);
				backing.len() != before
			},
			|removed| *removed,
		)
	}

	/// Removes everything. Always triggers, even when already empty.
	pub fn clear(&self) {
		self.write(|backing| backing.clear(), |_| true)
	}

	/// Arbitrary in-place mutation of the backing sequence. Always triggers.
	pub fn modify<R>(&self, func: impl FnOnce(&mut B) -> R) -> R {
		self.write(func, |_| true)
	}
}

impl<T> Default for ListState<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> From<Vec<T>> for ListState<T> {
	fn from(backing: Vec<T>) -> Self {
		Self::from_backing(backing)
	}
}

impl<T> FromIterator<T> for ListState<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::from_backing(iter.into_iter().collect())
	}
}

impl<T, B> State for ListState<T, B>
where
	B: Send + Sync,
{
	fn registry(&self) -> &ListenerRegistry {
		&self.body.registry
	}
}

impl<T, B> Debug for ListState<T, B>
where
	T: Debug,
	B: ListBacking<T>,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.body.backing.read().iter()).finish()
	}
}
