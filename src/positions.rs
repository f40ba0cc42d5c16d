use std::marker::PhantomData;
use foldhash::HashMap;

use crate::types::UnsignedInteger;

/* Slot sentinels. Any slot >= 0 is the item's current index in the heap
 * array; the negative values encode the two out-of-heap lifecycle states.
 * A map handed to the heap must read PRE_HEAP for every item that will
 * ever be inserted. */
pub const IN_HEAP: isize = 0;
pub const PRE_HEAP: isize = -1;
pub const POST_HEAP: isize = -2;

/// Externally owned mapping from items to their slot in the heap array.
/// The heap holds this exclusively for its whole lifetime and pairs every
/// record move with a `set` call; both operations must be O(1) amortized.
pub trait PositionMap {
	type Item: Copy;
	fn get(&self, item: Self::Item) -> isize;
	fn set(&mut self, item: Self::Item, pos: isize);
}

/// Dense position map for small non-negative integer items, the common
/// graph-vertex case. Backed by a plain `Vec<isize>` that grows on `set`;
/// items never written read PRE_HEAP without allocating.
pub struct VecPositionMap<I: UnsignedInteger> {
	_phantom: PhantomData<I>,
	slots: Vec<isize>,
}
impl<I: UnsignedInteger> VecPositionMap<I> {
	#[inline(always)]
	pub fn new() -> Self {
		Self{_phantom: PhantomData, slots: Vec::new()}
	}
	/// Pre-sizes the map for items `0..capacity`, all PRE_HEAP.
	#[inline(always)]
	pub fn with_capacity(capacity: usize) -> Self {
		assert!(capacity <= I::max_value().to_usize().unwrap());
		Self{_phantom: PhantomData, slots: vec![PRE_HEAP; capacity]}
	}
	/// Resets every slot to PRE_HEAP, making the map pristine for reuse.
	#[inline(always)]
	pub fn clear(&mut self) {
		self.slots.iter_mut().for_each(|s| *s = PRE_HEAP);
	}
}
impl<I: UnsignedInteger> PositionMap for VecPositionMap<I> {
	type Item = I;
	#[inline(always)]
	fn get(&self, item: I) -> isize {
		let idx = unsafe{item.to_usize().unwrap_unchecked()};
		if idx < self.slots.len() {
			unsafe{*self.slots.get_unchecked(idx)}
		} else {
			PRE_HEAP
		}
	}
	#[inline(always)]
	fn set(&mut self, item: I, pos: isize) {
		let idx = unsafe{item.to_usize().unwrap_unchecked()};
		if idx >= self.slots.len() {
			self.slots.resize(idx+1, PRE_HEAP);
		}
		unsafe{*self.slots.get_unchecked_mut(idx) = pos;}
	}
}

/// Hashed position map for opaque item types. Items never written
/// read PRE_HEAP.
pub struct HashPositionMap<I: Copy+Eq+std::hash::Hash> {
	slots: HashMap<I, isize>,
}
impl<I: Copy+Eq+std::hash::Hash> HashPositionMap<I> {
	#[inline(always)]
	pub fn new() -> Self {
		Self{slots: HashMap::default()}
	}
	/// Resets the map to pristine, every item reading PRE_HEAP again.
	#[inline(always)]
	pub fn clear(&mut self) {
		self.slots.clear();
	}
}
impl<I: Copy+Eq+std::hash::Hash> PositionMap for HashPositionMap<I> {
	type Item = I;
	#[inline(always)]
	fn get(&self, item: I) -> isize {
		*self.slots.get(&item).unwrap_or(&PRE_HEAP)
	}
	#[inline(always)]
	fn set(&mut self, item: I, pos: isize) {
		self.slots.insert(item, pos);
	}
}


#[test]
fn test_vec_position_map() {
	let mut map = VecPositionMap::<u32>::new();
	/* Never-seen items read PRE_HEAP without growing the map */
	(0..100u32).for_each(|i| assert_eq!(map.get(i), PRE_HEAP));
	assert_eq!(map.slots.len(), 0);
	map.set(7, 3);
	assert_eq!(map.get(7), 3);
	assert_eq!(map.slots.len(), 8);
	/* The gap filled by growth still reads PRE_HEAP */
	(0..7u32).for_each(|i| assert_eq!(map.get(i), PRE_HEAP));
	map.set(7, POST_HEAP);
	assert_eq!(map.get(7), POST_HEAP);
	map.set(2, IN_HEAP);
	assert_eq!(map.get(2), IN_HEAP);
	map.clear();
	(0..100u32).for_each(|i| assert_eq!(map.get(i), PRE_HEAP));
}

#[test]
fn test_vec_position_map_with_capacity() {
	let map = VecPositionMap::<u8>::with_capacity(255);
	(0..255u8).for_each(|i| assert_eq!(map.get(i), PRE_HEAP));
	assert_eq!(map.slots.len(), 255);
}

#[test]
fn test_hash_position_map() {
	let mut map = HashPositionMap::<&str>::new();
	assert_eq!(map.get("a"), PRE_HEAP);
	map.set("a", 0);
	map.set("b", POST_HEAP);
	assert_eq!(map.get("a"), 0);
	assert_eq!(map.get("b"), POST_HEAP);
	assert_eq!(map.get("c"), PRE_HEAP);
	map.clear();
	assert_eq!(map.get("a"), PRE_HEAP);
}
