use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use crate::registry::ListenerRegistry;
use crate::State;

/// A key-value store with unique keys that a [`MapState`] can observe.
pub trait MapBacking<K, V> {
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get(&self, key: &K) -> Option<&V>;

	fn contains_key(&self, key: &K) -> bool {
		self.get(key).is_some()
	}

	fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_>;

	fn insert(&mut self, key: K, value: V) -> Option<V>;

	fn remove(&mut self, key: &K) -> Option<V>;

	fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&K, &mut V) -> bool;

	fn clear(&mut self);
}

impl<K, V, S> MapBacking<K, V> for HashMap<K, V, S>
where
	K: Eq + Hash,
	S: BuildHasher,
{
	fn len(&self) -> usize {
		HashMap::len(self)
	}

	fn get(&self, key: &K) -> Option<&V> {
		HashMap::get(self, key)
	}

	fn contains_key(&self, key: &K) -> bool {
		HashMap::contains_key(self, key)
	}

	fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
		Box::new(HashMap::iter(self))
	}

	fn insert(&mut self, key: K, value: V) -> Option<V> {
		HashMap::insert(self, key, value)
	}

	fn remove(&mut self, key: &K) -> Option<V> {
		HashMap::remove(self, key)
	}

	fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&K, &mut V) -> bool,
	{
		HashMap::retain(self, keep)
	}

	fn clear(&mut self) {
		HashMap::clear(self)
	}
}

impl<K, V> MapBacking<K, V> for BTreeMap<K, V>
where
	K: Ord,
{
	fn len(&self) -> usize {
		BTreeMap::len(self)
	}

	fn get(&self, key: &K) -> Option<&V> {
		BTreeMap::get(self, key)
	}

	fn contains_key(&self, key: &K) -> bool {
		BTreeMap::contains_key(self, key)
	}

	fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
		Box::new(BTreeMap::iter(self))
	}

	fn insert(&mut self, key: K, value: V) -> Option<V> {
		BTreeMap::insert(self, key, value)
	}

	fn remove(&mut self, key: &K) -> Option<V> {
		BTreeMap::remove(self, key)
	}

	fn retain<F>(&mut self, keep: F)
	where
		F: FnMut(&K, &mut V) -> bool,
	{
		BTreeMap::retain(self, keep)
	}

	fn clear(&mut self) {
		BTreeMap::clear(self)
	}
}

/// An observable map.
///
/// Reads go straight to the backing map. `insert`, `remove`, `extend` and
/// `clear` always trigger, whether or not the stored mapping looks different
/// afterwards; `retain` triggers when it removed something.
pub struct MapState<K, V, B = FxHashMap<K, V>> {
	body: Arc<MapBody<K, V, B>>,
}

struct MapBody<K, V, B> {
	backing: RwLock<B>,
	registry: ListenerRegistry,
	_entry: PhantomData<fn() -> (K, V)>,
}

impl<K, V, B> Clone for MapState<K, V, B> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<K, V> MapState<K, V>
where
	K: Eq + Hash,
{
	pub fn new() -> Self {
		Self::from_backing(FxHashMap::default())
	}
}

impl<K, V, B> MapState<K, V, B>
where
	B: MapBacking<K, V>,
{
	pub fn from_backing(backing: B) -> Self {
		Self::with_registry(backing, ListenerRegistry::new())
	}

	pub fn with_registry(backing: B, registry: ListenerRegistry) -> Self {
		MapState {
			body: Arc::new(MapBody {
				backing: RwLock::new(backing),
				registry,
				_entry: PhantomData,
			}),
		}
	}

	fn write<R>(&self, func: impl FnOnce(&mut B) -> R, changed: impl FnOnce(&R) -> bool) -> R {
		let result = func(&mut *self.body.backing.write());
		if changed(&result) {
			self.body.registry.notify();
		}
		result
	}

	pub fn len(&self) -> usize {
		self.body.backing.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.body.backing.read().is_empty()
	}

	pub fn get(&self, key: &K) -> Option<MappedRwLockReadGuard<'_, V>> {
		RwLockReadGuard::try_map(self.body.backing.read(), |backing| backing.get(key)).ok()
	}

	pub fn get_cloned(&self, key: &K) -> Option<V>
	where
		V: Clone,
	{
		self.body.backing.read().get(key).cloned()
	}

	pub fn contains_key(&self, key: &K) -> bool {
		self.body.backing.read().contains_key(key)
	}

	pub fn contains_value(&self, value: &V) -> bool
	where
		V: PartialEq,
	{
		self.body
			.backing
			.read()
			.iter()
			.any(|(_, item)| item == value)
	}

	pub fn keys(&self) -> Vec<K>
	where
		K: Clone,
	{
		self.body
			.backing
			.read()
			.iter()
			.map(|(key, _)| key.clone())
			.collect()
	}

	pub fn values(&self) -> Vec<V>
	where
		V: Clone,
	{
		self.body
			.backing
			.read()
			.iter()
			.map(|(_, value)| value.clone())
			.collect()
	}

	pub fn entries(&self) -> Vec<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		self.body
			.backing
			.read()
			.iter()
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect()
	}

	pub fn read(&self) -> RwLockReadGuard<'_, B> {
		self.body.backing.read()
	}

	pub fn with<R>(&self, func: impl FnOnce(&B) -> R) -> R {
		func(&*self.body.backing.read())
	}

	/// Maps `key` to `value`, returning the previous value. Always triggers.
	pub fn insert(&self, key: K, value: V) -> Option<V> {
		self.write(|backing| backing.insert(key, value), |_| true)
	}

	/// Always triggers, even when `key` was not mapped.
	pub fn remove(&self, key: &K) -> Option<V> {
		self.write(|backing| backing.remove(key), |_| true)
	}

	pub fn extend(&self, entries: impl IntoIterator<Item = (K, V)>) {
		self.write(
			|backing| {
				for (key, value) in entries {
					backing.insert(key, value);
				}
			},
			|_| true,
		)
	}

	pub fn retain(&self, keep: impl FnMut(&K, &mut V) -> bool) -> bool {
		self.write(
			|backing| {
				let before = backing.len();
				backing.retain(keep);
				backing.len() != before
			},
			|removed| *removed,
		)
	}

	pub fn clear(&self) {
		self.write(|backing| backing.clear(), |_| true)
	}

	/// Arbitrary in-place mutation of the backing map. Always triggers.
	pub fn modify<R>(&self, func: impl FnOnce(&mut B) -> R) -> R {
		self.write(func, |_| true)
	}
}

impl<K, V> Default for MapState<K, V>
where
	K: Eq + Hash,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V, B> FromIterator<(K, V)> for MapState<K, V, B>
where
	B: MapBacking<K, V> + Default,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut backing = B::default();
		for (key, value) in iter {
			backing.insert(key, value);
		}
		Self::from_backing(backing)
	}
}

impl<K, V, B> State for MapState<K, V, B>
where
	B: Send + Sync,
{
	fn registry(&self) -> &ListenerRegistry {
		&self.body.registry
	}
}

impl<K, V, B> Debug for MapState<K, V, B>
where
	K: Debug,
	V: Debug,
	B: MapBacking<K, V>,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.body.backing.read().iter()).finish()
	}
}
