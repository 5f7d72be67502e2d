//! Bounded binary min-heap.
//!
//! Unlike [`std::collections::BinaryHeap`] the heap exposes its positions and a logical size that is independent
//! of the stored elements: shrinking the heap with [`MinHeap::set_len`] keeps the elements past the active prefix
//! in place ("frozen") so they can be reactivated later without reallocation. Replacement selection relies on that
//! to keep records that do not fit the current run.
//!
//! Invalid positions, inserting into a full heap and removing from an empty heap are programming errors and panic.

use std::cmp::Ordering;
use std::mem;

/// Binary min-heap with a fixed capacity and a mutable active length.
pub struct MinHeap<T, F> {
    // active elements occupy [0, len), frozen elements occupy [len, items.len())
    items: Vec<T>,
    len: usize,
    capacity: usize,
    compare: F,
}

impl<T, F> MinHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Creates a heap over the provided items and restores heap order over the first `len` of them.
    ///
    /// # Arguments
    /// * `items` - Heap backing storage, its length is the number of stored elements
    /// * `len` - Number of active elements
    /// * `capacity` - Maximum number of stored elements
    /// * `compare` - Function to be used to compare elements
    ///
    /// The backing vector grows up to `capacity` in place, so `items` may be shorter than `capacity` but never
    /// longer.
    ///
    /// # Panics
    /// Panics if `len` exceeds the number of items or the number of items exceeds `capacity`.
    pub fn new(mut items: Vec<T>, len: usize, capacity: usize, compare: F) -> Self {
        assert!(
            len <= items.len() && items.len() <= capacity,
            "heap size {} or stored items {} beyond capacity {}",
            len,
            items.len(),
            capacity
        );
        items.reserve_exact(capacity - items.len());

        let mut heap = MinHeap {
            items,
            len,
            capacity,
            compare,
        };
        heap.build();

        return heap;
    }

    /// Creates an empty heap able to hold `capacity` elements.
    pub fn with_capacity(capacity: usize, compare: F) -> Self {
        MinHeap {
            items: Vec::with_capacity(capacity),
            len: 0,
            capacity,
            compare,
        }
    }

    /// Returns the number of active elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of stored elements, active and frozen.
    pub fn stored(&self) -> usize {
        self.items.len()
    }

    /// Returns the active elements in heap order.
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    /// Changes the number of active elements without touching the storage.
    /// [`MinHeap::build`] must be called afterwards if the new active prefix is not heap ordered.
    ///
    /// # Panics
    /// Panics if `len` exceeds the number of stored elements.
    pub fn set_len(&mut self, len: usize) {
        assert!(
            len <= self.items.len(),
            "heap size {} beyond stored items {}",
            len,
            self.items.len()
        );
        self.len = len;
    }

    /// Restores heap order over the active elements.
    pub fn build(&mut self) {
        if self.len < 2 {
            return;
        }
        for pos in (0..=parent_of(self.len - 1)).rev() {
            self.sift_down(pos);
        }
    }

    /// Inserts a value into the heap.
    ///
    /// # Panics
    /// Panics if the heap storage is full.
    pub fn insert(&mut self, value: T) {
        assert!(self.items.len() < self.capacity, "heap is full; cannot insert");

        self.items.push(value);
        let last = self.items.len() - 1;
        if last != self.len {
            // slot is taken by a frozen element, move it to the tail
            self.items.swap(self.len, last);
        }
        self.len += 1;
        self.sift_up(self.len - 1);
    }

    /// Removes the minimum value from the heap and returns it.
    ///
    /// # Panics
    /// Panics if the heap is empty.
    pub fn remove_min(&mut self) -> T {
        assert!(self.len > 0, "heap is empty; cannot remove");

        self.len -= 1;
        self.items.swap(0, self.len);
        if self.len > 0 {
            self.sift_down(0);
        }

        return self.items.swap_remove(self.len);
    }

    /// Replaces the value at `pos` with `value`, restores heap order and returns the previous value.
    pub fn replace(&mut self, pos: usize, value: T) -> T {
        self.check_pos(pos);
        let previous = mem::replace(&mut self.items[pos], value);
        self.update(pos);

        return previous;
    }

    /// Restores heap order after the element at `pos` has been changed in place.
    pub fn update(&mut self, pos: usize) {
        let pos = self.sift_up(pos);
        self.sift_down(pos);
    }

    /// Returns the minimum value.
    pub fn peek_min(&self) -> &T {
        self.get(0)
    }

    pub fn get(&self, pos: usize) -> &T {
        self.check_pos(pos);
        &self.items[pos]
    }

    /// Returns a mutable reference to the element at `pos`.
    /// [`MinHeap::update`] must be called if the change affects the element ordering.
    pub fn get_mut(&mut self, pos: usize) -> &mut T {
        self.check_pos(pos);
        &mut self.items[pos]
    }

    pub fn swap(&mut self, pos1: usize, pos2: usize) {
        self.check_pos(pos1);
        self.check_pos(pos2);
        self.items.swap(pos1, pos2);
    }

    pub fn is_leaf(&self, pos: usize) -> bool {
        self.check_pos(pos);
        pos >= self.len / 2
    }

    pub fn parent(&self, pos: usize) -> usize {
        self.check_pos(pos);
        parent_of(pos)
    }

    pub fn left_child(&self, pos: usize) -> usize {
        self.check_pos(pos);
        2 * pos + 1
    }

    pub fn right_child(&self, pos: usize) -> usize {
        self.check_pos(pos);
        2 * pos + 2
    }

    /// Moves the element at `pos` down to its place. Returns the final position.
    fn sift_down(&mut self, mut pos: usize) -> usize {
        self.check_pos(pos);
        while pos < self.len / 2 {
            let mut child = 2 * pos + 1;
            if child + 1 < self.len && self.is_less(child + 1, child) {
                child += 1;
            }
            if !self.is_less(child, pos) {
                break;
            }
            self.items.swap(pos, child);
            pos = child;
        }

        return pos;
    }

    /// Moves the element at `pos` up to its place. Returns the final position.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        self.check_pos(pos);
        while pos > 0 {
            let parent = parent_of(pos);
            if !self.is_less(pos, parent) {
                break;
            }
            self.items.swap(pos, parent);
            pos = parent;
        }

        return pos;
    }

    fn is_less(&self, pos1: usize, pos2: usize) -> bool {
        (self.compare)(&self.items[pos1], &self.items[pos2]) == Ordering::Less
    }

    fn check_pos(&self, pos: usize) {
        assert!(pos < self.len, "invalid heap position {} (heap size {})", pos, self.len);
    }
}

fn parent_of(pos: usize) -> usize {
    (pos.max(1) - 1) / 2
}
