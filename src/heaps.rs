use crate::compare::{Compare, Less};
use crate::positions::{PositionMap, PRE_HEAP, POST_HEAP};

pub trait HeapPrio: Copy {}
impl<T: Copy> HeapPrio for T {}

/// Lifecycle of an item with respect to a heap, as encoded in its
/// PositionMap slot: any slot >= 0 collapses to `InHeap`, the negative
/// sentinels pass through.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum State {
	InHeap = 0,
	PreHeap = -1,
	PostHeap = -2,
}

/*
 * Addressable binary min-heap over (item, priority) records.
 * The defining feature over a plain heap is that resident items can be
 * re-prioritized or erased in place, addressed by identity: an injected
 * PositionMap tracks item -> array index and is kept in perfect lockstep
 * with the record array across every mutation. All physical record moves
 * go through `_place`, which writes the array slot and the map slot
 * together; no code path updates one side without the other.
 *
 * The heap borrows its PositionMap mutably for its entire lifetime, so no
 * one else can touch slots of resident items while the heap is alive. The
 * map must read PRE_HEAP (-1) for every item before its first insertion.
 *
 * Misuse (popping an empty heap, addressing a non-resident item, pushing a
 * duplicate, non-monotone decrease/increase, a comparator that is not a
 * strict weak order) is a precondition violation: debug builds assert,
 * release builds are left in an undefined state. There is no error channel.
 */
pub struct IndexedHeap<'a, P: HeapPrio, M: PositionMap, C: Compare<P> = Less> {
	data: Vec<(M::Item, P)>,
	comp: C,
	positions: &'a mut M,
}

impl<'a, P: HeapPrio, M: PositionMap, C: Compare<P>> IndexedHeap<'a, P, M, C> {
	/// Creates an empty heap around `positions` with the default comparator.
	/// No array storage is allocated up front.
	#[inline(always)]
	pub fn new(positions: &'a mut M) -> Self where C: Default {
		Self{data: Vec::new(), comp: C::default(), positions: positions}
	}
	/// Creates an empty heap with preallocated record storage.
	#[inline(always)]
	pub fn with_capacity(positions: &'a mut M, capacity: usize) -> Self where C: Default {
		Self{data: Vec::with_capacity(capacity), comp: C::default(), positions: positions}
	}
	/// Creates an empty heap with an explicit comparator value.
	#[inline(always)]
	pub fn with_comparator(positions: &'a mut M, comp: C) -> Self {
		Self{data: Vec::new(), comp: comp, positions: positions}
	}

	#[inline(always)]
	fn _parent(i: usize) -> usize { (i-1)/2 }
	#[inline(always)]
	fn _second_child(i: usize) -> usize { 2*i+2 }
	#[inline(always)]
	fn _less(&self, a: &(M::Item, P), b: &(M::Item, P)) -> bool {
		self.comp.less(&a.1, &b.1)
	}
	/// The move primitive: writes a record into an array slot and that slot
	/// back into the item's map entry. The two writes are never separated.
	#[inline(always)]
	fn _place(&mut self, rec: (M::Item, P), pos: usize) {
		self.data[pos] = rec;
		self.positions.set(rec.0, pos as isize);
	}
	/// Sifts `rec` up from the hole at `h` while it is strictly less than
	/// its parent, moving parents down into the hole. Returns the final
	/// index of `rec`.
	fn _bubble_up(&mut self, mut h: usize, rec: (M::Item, P)) -> usize {
		while h > 0 {
			let par = Self::_parent(h);
			if !self._less(&rec, &self.data[par]) { break; }
			self._place(self.data[par], h);
			h = par;
		}
		self._place(rec, h);
		h
	}
	/// Sifts `rec` down from the hole at `h` over the first `length`
	/// records, moving the smaller child up into the hole while `rec` is
	/// strictly greater than it. Returns the final index of `rec`.
	fn _bubble_down(&mut self, mut h: usize, rec: (M::Item, P), length: usize) -> usize {
		/* Walk with the right child as the loop bound and select the
		 * smaller sibling inside; the fixup after the loop handles a last
		 * internal node that only has a left child. */
		let mut child = Self::_second_child(h);
		while child < length {
			if self._less(&self.data[child-1], &self.data[child]) {
				child -= 1;
			}
			if !self._less(&self.data[child], &rec) {
				self._place(rec, h);
				return h;
			}
			self._place(self.data[child], h);
			h = child;
			child = Self::_second_child(h);
		}
		child -= 1;
		if child < length && self._less(&self.data[child], &rec) {
			self._place(self.data[child], h);
			h = child;
		}
		self._place(rec, h);
		h
	}

	/// The number of resident records.
	#[inline(always)]
	pub fn size(&self) -> usize {
		self.data.len()
	}
	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
	/// The item with minimum priority. The heap must be non-empty.
	#[inline(always)]
	pub fn top(&self) -> M::Item {
		debug_assert!(!self.data.is_empty());
		self.data[0].0
	}
	/// The minimum priority. The heap must be non-empty.
	#[inline(always)]
	pub fn prio(&self) -> P {
		debug_assert!(!self.data.is_empty());
		self.data[0].1
	}
	/// The priority of a resident item. The item must be in the heap.
	#[inline(always)]
	pub fn get(&self, item: M::Item) -> P {
		let idx = self.positions.get(item);
		debug_assert!(idx >= 0 && (idx as usize) < self.data.len());
		self.data[idx as usize].1
	}
	/// The lifecycle state of `item`, read off its map slot.
	#[inline(always)]
	pub fn state(&self, item: M::Item) -> State {
		let s = self.positions.get(item);
		if s >= 0 {
			State::InHeap
		} else if s == PRE_HEAP {
			State::PreHeap
		} else {
			State::PostHeap
		}
	}
	/// Read access to the borrowed position map. Writing stays impossible
	/// while the heap is alive.
	#[inline(always)]
	pub fn positions(&self) -> &M {
		self.positions
	}
	/// Reserves record storage for at least `capacity` additional pushes.
	#[inline(always)]
	pub fn reserve(&mut self, capacity: usize) {
		self.data.reserve(capacity);
	}

	/// Inserts an item with the given priority. The item must not already
	/// be in the heap (use `set` for insert-or-update).
	pub fn push(&mut self, item: M::Item, prio: P) {
		debug_assert!(self.positions.get(item) < 0);
		let n = self.data.len();
		self.data.push((item, prio));
		self._bubble_up(n, (item, prio));
	}
	/// Removes the item with minimum priority, marking it PostHeap. The
	/// heap must be non-empty.
	pub fn pop(&mut self) {
		debug_assert!(!self.data.is_empty());
		let n = self.data.len()-1;
		/* Mark before the sift so the slot never aliases a live index */
		self.positions.set(self.data[0].0, POST_HEAP);
		if n > 0 {
			self._bubble_down(0, self.data[n], n);
		}
		self.data.truncate(n);
	}
	/// Removes a resident item from anywhere in the heap, marking it
	/// PostHeap. The item must be in the heap.
	pub fn erase(&mut self, item: M::Item) {
		let h = self.positions.get(item);
		debug_assert!(h >= 0 && (h as usize) < self.data.len());
		let h = h as usize;
		let n = self.data.len()-1;
		self.positions.set(item, POST_HEAP);
		if h < n {
			/* The last record refills the hole and may have to travel in
			 * either direction: sift it up first, and only if that leaves
			 * it at the hole sift it down over the shortened length. */
			let rec = self.data[n];
			if self._bubble_up(h, rec) == h {
				self._bubble_down(h, rec, n);
			}
		}
		self.data.truncate(n);
	}
	/// Lowers the priority of a resident item to `prio`. The new priority
	/// must not be strictly greater than the stored one.
	pub fn decrease(&mut self, item: M::Item, prio: P) {
		let idx = self.positions.get(item);
		debug_assert!(idx >= 0 && (idx as usize) < self.data.len());
		debug_assert!(!self.comp.less(&self.data[idx as usize].1, &prio));
		self._bubble_up(idx as usize, (item, prio));
	}
	/// Raises the priority of a resident item to `prio`. The new priority
	/// must not be strictly less than the stored one.
	pub fn increase(&mut self, item: M::Item, prio: P) {
		let idx = self.positions.get(item);
		debug_assert!(idx >= 0 && (idx as usize) < self.data.len());
		debug_assert!(!self.comp.less(&prio, &self.data[idx as usize].1));
		let length = self.data.len();
		self._bubble_down(idx as usize, (item, prio), length);
	}
	/// Unchecked setter: inserts `item` if it is not in the heap, otherwise
	/// moves it to `prio` in whichever direction is needed. Subsumes
	/// `decrease` and `increase`.
	pub fn set(&mut self, item: M::Item, prio: P) {
		let idx = self.positions.get(item);
		if idx < 0 {
			self.push(item, prio);
		} else if self.comp.less(&prio, &self.data[idx as usize].1) {
			self._bubble_up(idx as usize, (item, prio));
		} else {
			let length = self.data.len();
			self._bubble_down(idx as usize, (item, prio), length);
		}
	}
	/// External state override. Demoting a resident item to `PreHeap` or
	/// `PostHeap` erases it first, then writes the negative slot; useful to
	/// hand items back to the caller without a full drain. Setting `InHeap`
	/// is a silent no-op, the only way into the heap is `push`/`set`.
	pub fn set_state(&mut self, item: M::Item, state: State) {
		match state {
			State::PreHeap | State::PostHeap => {
				if self.state(item) == State::InHeap {
					self.erase(item);
				}
				self.positions.set(item, state as isize);
			}
			State::InHeap => {}
		}
	}
	/// O(1) identity substitution: `new` takes over the heap slot, priority
	/// and heap structure untouched, and the two map slots are swapped (so
	/// `old` reads `new`'s previous negative slot). `old` must be in the
	/// heap, `new` must not.
	pub fn replace(&mut self, old: M::Item, new: M::Item) {
		let idx = self.positions.get(old);
		debug_assert!(idx >= 0 && (idx as usize) < self.data.len());
		debug_assert!(self.positions.get(new) < 0);
		self.positions.set(old, self.positions.get(new));
		self.positions.set(new, idx);
		self.data[idx as usize].0 = new;
	}
	/// Drops all records without touching the position map. Former
	/// residents keep their stale non-negative slots: reuse the heap only
	/// with a fresh map, or reset those entries to PRE_HEAP first. This is
	/// an explicit performance trade, a map-wide reset would make `clear`
	/// O(map) instead of O(1).
	pub fn clear(&mut self) {
		self.data.clear();
	}
}


#[cfg(test)]
fn _random_prios(n: usize) -> Vec<u64> {
	(0..n).map(|_| rand::random::<u64>() % 1_000_000).collect()
}
/* Checks heap order and index agreement over the full array; the tests
 * drive mutations through this after every step. */
#[cfg(test)]
fn _check_invariants<P: HeapPrio, M: PositionMap, C: Compare<P>>(heap: &IndexedHeap<P, M, C>) {
	let n = heap.data.len();
	(1..n).for_each(|i| {
		let par = IndexedHeap::<P, M, C>::_parent(i);
		assert!(!heap._less(&heap.data[i], &heap.data[par]), "heap order violated at {:?}", i);
	});
	(0..n).for_each(|i| {
		assert_eq!(heap.positions.get(heap.data[i].0), i as isize, "index agreement violated at {:?}", i);
	});
}
#[cfg(test)]
fn _drain_prios<P: HeapPrio, M: PositionMap, C: Compare<P>>(heap: &mut IndexedHeap<P, M, C>) -> Vec<P> {
	let mut prios = Vec::with_capacity(heap.size());
	while !heap.is_empty() {
		prios.push(heap.prio());
		let top = heap.top();
		heap.pop();
		assert_eq!(heap.state(top), State::PostHeap);
		_check_invariants(heap);
	}
	prios
}

#[test]
fn test_push_drain_sorted() {
	use crate::positions::VecPositionMap;
	let n = 10_000;
	let prios = _random_prios(n);
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u64, _>::new(&mut map);
	prios.iter().enumerate().for_each(|(i,&p)| {
		heap.push(i as u32, p);
		assert_eq!(heap.state(i as u32), State::InHeap);
	});
	_check_invariants(&heap);
	let mut sorted = prios.clone();
	sorted.sort();
	assert_eq!(_drain_prios(&mut heap), sorted);
}

#[test]
fn test_random_operations() {
	use crate::positions::VecPositionMap;
	use rand::Rng;
	let n_items = 300u32;
	let n_ops = 30_000;
	let mut rng = rand::thread_rng();
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u64, _>::new(&mut map);
	/* Mirror of the expected resident set: item -> its current priority */
	let mut model = std::collections::HashMap::<u32, u64>::new();
	for _ in 0..n_ops {
		let item = rng.gen_range(0..n_items);
		match rng.gen_range(0..6) {
			0 => {
				/* push a non-resident item */
				if !model.contains_key(&item) {
					let p = rng.gen_range(0..1_000_000u64);
					heap.push(item, p);
					model.insert(item, p);
				}
			}
			1 => {
				if !heap.is_empty() {
					let top = heap.top();
					assert_eq!(model.remove(&top).unwrap(), heap.prio());
					/* the root must be a minimum of the model */
					assert!(model.values().all(|&p| p >= heap.prio()));
					heap.pop();
				}
			}
			2 => {
				/* set works on residents and absentees alike */
				let p = rng.gen_range(0..1_000_000u64);
				heap.set(item, p);
				model.insert(item, p);
			}
			3 => {
				if model.contains_key(&item) {
					heap.erase(item);
					model.remove(&item);
					assert_eq!(heap.state(item), State::PostHeap);
				}
			}
			4 => {
				if let Some(&old) = model.get(&item) {
					let p = rng.gen_range(0..=old);
					heap.decrease(item, p);
					model.insert(item, p);
				}
			}
			_ => {
				if let Some(&old) = model.get(&item) {
					let p = rng.gen_range(old..1_000_000u64);
					heap.increase(item, p);
					model.insert(item, p);
				}
			}
		}
		_check_invariants(&heap);
		assert_eq!(heap.size(), model.len());
		model.iter().for_each(|(&i,&p)| {
			assert_eq!(heap.state(i), State::InHeap);
			assert_eq!(heap.get(i), p);
		});
	}
	/* Drain what is left and cross-check against the model */
	let mut expected = model.values().copied().collect::<Vec<_>>();
	expected.sort();
	assert_eq!(_drain_prios(&mut heap), expected);
}

#[test]
fn test_set_idempotent() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u64, _>::new(&mut map);
	(0..50u32).for_each(|i| heap.push(i, _random_prios(1)[0]));
	heap.set(25, 3);
	let snapshot = heap.data.clone();
	heap.set(25, 3);
	assert_eq!(heap.data, snapshot);
	_check_invariants(&heap);
}

#[test]
fn test_decrease_equals_set_smaller() {
	use crate::positions::VecPositionMap;
	let prios = _random_prios(200);
	let mut map_a = VecPositionMap::<u32>::new();
	let mut heap_a = IndexedHeap::<u64, _>::new(&mut map_a);
	let mut map_b = VecPositionMap::<u32>::new();
	let mut heap_b = IndexedHeap::<u64, _>::new(&mut map_b);
	prios.iter().enumerate().for_each(|(i,&p)| {
		heap_a.push(i as u32, p+1);
		heap_b.push(i as u32, p+1);
	});
	heap_a.decrease(100, prios[100]);
	heap_b.set(100, prios[100]);
	assert_eq!(heap_a.data, heap_b.data);
	_check_invariants(&heap_a);
}

/* Scenario: sorted drain of items pushed out of order */
#[test]
fn test_drain_order_items() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	[3u32, 1, 4, 5, 9, 2, 6].iter().for_each(|&i| heap.push(i, 10*i));
	let mut drained = Vec::new();
	while !heap.is_empty() {
		drained.push(heap.top());
		heap.pop();
	}
	assert_eq!(drained, vec![1, 2, 3, 4, 5, 6, 9]);
}

/* Scenario: decrease-key moves an item to the root */
#[test]
fn test_decrease_key() {
	use crate::positions::HashPositionMap;
	let mut map = HashPositionMap::<char>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	heap.push('A', 5);
	heap.push('B', 3);
	heap.push('C', 7);
	assert_eq!(heap.top(), 'B');
	heap.decrease('C', 1);
	assert_eq!(heap.top(), 'C');
	assert_eq!(heap.prio(), 1);
	let mut drained = Vec::new();
	while !heap.is_empty() {
		drained.push(heap.top());
		heap.pop();
	}
	assert_eq!(drained, vec!['C', 'B', 'A']);
}

/* Scenario: erasing a middle item */
#[test]
fn test_erase_middle() {
	use crate::positions::HashPositionMap;
	let mut map = HashPositionMap::<char>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	"abcde".chars().zip(1..).for_each(|(c,p)| heap.push(c, p));
	heap.erase('c');
	assert_eq!(heap.size(), 4);
	assert_eq!(heap.state('c'), State::PostHeap);
	_check_invariants(&heap);
	let mut drained = Vec::new();
	while !heap.is_empty() {
		drained.push(heap.top());
		heap.pop();
	}
	assert_eq!(drained, vec!['a', 'b', 'd', 'e']);
}

/* Scenario: increase-key pushes the root away */
#[test]
fn test_increase_key() {
	use crate::positions::HashPositionMap;
	let mut map = HashPositionMap::<char>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	heap.push('x', 1);
	heap.push('y', 2);
	heap.push('z', 3);
	heap.increase('x', 10);
	assert_eq!(heap.top(), 'y');
	let mut drained = Vec::new();
	while !heap.is_empty() {
		drained.push(heap.top());
		heap.pop();
	}
	assert_eq!(drained, vec!['y', 'z', 'x']);
}

/* Scenario: set on an absent item inserts */
#[test]
fn test_set_absent() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	heap.set(11, 7);
	assert_eq!(heap.size(), 1);
	assert_eq!(heap.top(), 11);
	assert_eq!(heap.state(11), State::InHeap);
}

/* Scenario: identity replacement */
#[test]
fn test_replace() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	heap.push(5, 42);
	assert_eq!(heap.state(8), State::PreHeap);
	heap.replace(5, 8);
	assert_eq!(heap.size(), 1);
	assert_eq!(heap.top(), 8);
	assert_eq!(heap.get(8), 42);
	assert_eq!(heap.state(5), State::PreHeap);
	assert_eq!(heap.state(8), State::InHeap);
	_check_invariants(&heap);
}

#[test]
fn test_replace_after_removal() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	heap.push(1, 10);
	heap.push(2, 20);
	heap.pop();
	assert_eq!(heap.state(1), State::PostHeap);
	/* The replaced-out item inherits the incoming item's old slot */
	heap.replace(2, 1);
	assert_eq!(heap.state(1), State::InHeap);
	assert_eq!(heap.state(2), State::PostHeap);
	assert_eq!(heap.get(1), 20);
}

#[test]
fn test_set_state_override() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	(0..10u32).for_each(|i| heap.push(i, i));
	/* Demotion of a resident erases first */
	heap.set_state(4, State::PreHeap);
	assert_eq!(heap.size(), 9);
	assert_eq!(heap.state(4), State::PreHeap);
	heap.set_state(5, State::PostHeap);
	assert_eq!(heap.state(5), State::PostHeap);
	_check_invariants(&heap);
	/* Setting InHeap is a no-op, resident or not */
	heap.set_state(6, State::InHeap);
	assert_eq!(heap.state(6), State::InHeap);
	heap.set_state(4, State::InHeap);
	assert_eq!(heap.state(4), State::PreHeap);
	/* Demoted items can come back */
	heap.push(4, 100);
	assert_eq!(heap.state(4), State::InHeap);
}

#[test]
fn test_clear_leaves_map_stale() {
	use crate::positions::VecPositionMap;
	let mut map = VecPositionMap::<u32>::new();
	{
		let mut heap = IndexedHeap::<u32, _>::new(&mut map);
		(0..10u32).for_each(|i| heap.push(i, 100-i));
		heap.clear();
		assert!(heap.is_empty());
	}
	/* The map still carries the stale non-negative slots... */
	assert!((0..10u32).any(|i| map.get(i) >= 0));
	/* ...so reuse requires an explicit reset to PRE_HEAP */
	map.clear();
	(0..10u32).for_each(|i| assert_eq!(map.get(i), PRE_HEAP));
	let mut heap = IndexedHeap::<u32, _>::new(&mut map);
	heap.push(3, 30);
	assert_eq!(heap.top(), 3);
}

#[test]
fn test_max_heap_ordering() {
	use crate::compare::Greater;
	use crate::positions::VecPositionMap;
	let n = 1_000;
	let prios = _random_prios(n);
	let mut map = VecPositionMap::<u32>::new();
	let mut heap = IndexedHeap::<u64, _, Greater>::new(&mut map);
	prios.iter().enumerate().for_each(|(i,&p)| heap.push(i as u32, p));
	_check_invariants(&heap);
	let mut sorted = prios.clone();
	sorted.sort();
	sorted.reverse();
	assert_eq!(_drain_prios(&mut heap), sorted);
}

#[test]
fn test_fn_comparator() {
	use crate::compare::FnCompare;
	use crate::positions::VecPositionMap;
	/* Order f64 priorities through a closure, largest magnitude last */
	let mut map = VecPositionMap::<u32>::new();
	let comp = FnCompare::new(|a: &f64, b: &f64| a.abs() < b.abs());
	let mut heap = IndexedHeap::with_comparator(&mut map, comp);
	heap.push(0, -0.5);
	heap.push(1, 2.0);
	heap.push(2, -3.0);
	heap.push(3, 1.0);
	let mut drained = Vec::new();
	while !heap.is_empty() {
		drained.push(heap.top());
		heap.pop();
	}
	assert_eq!(drained, vec![0, 3, 1, 2]);
}

/* The intended use: shortest-path relaxation over a small weighted graph,
 * every vertex resident at most once. */
#[test]
fn test_shortest_path_relaxation() {
	use crate::positions::VecPositionMap;
	let n = 6usize;
	let edges: Vec<(u32, u32, u64)> = vec![
		(0, 1, 7), (0, 2, 9), (0, 5, 14),
		(1, 2, 10), (1, 3, 15),
		(2, 3, 11), (2, 5, 2),
		(3, 4, 6),
		(4, 5, 9),
	];
	/* Undirected adjacency */
	let mut adj = vec![Vec::new(); n];
	edges.iter().for_each(|&(u,v,w)| {
		adj[u as usize].push((v, w));
		adj[v as usize].push((u, w));
	});
	let mut map = VecPositionMap::<u32>::with_capacity(n);
	let mut heap = IndexedHeap::<u64, _>::new(&mut map);
	let mut dist = vec![u64::MAX; n];
	dist[0] = 0;
	heap.push(0, 0);
	while !heap.is_empty() {
		let u = heap.top();
		let d = heap.prio();
		heap.pop();
		for &(v, w) in &adj[u as usize] {
			let nd = d + w;
			if nd < dist[v as usize] && heap.state(v) != State::PostHeap {
				dist[v as usize] = nd;
				/* insert-or-decrease in one call */
				heap.set(v, nd);
			}
		}
	}
	assert_eq!(dist, vec![0, 7, 9, 20, 20, 11]);
}
