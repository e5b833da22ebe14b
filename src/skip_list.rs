use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::mem;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::ops::RangeBounds;
use std::ptr::NonNull;


thread_local!(
    static ZSET_RNG: RefCell<rand::rngs::SmallRng> =
        RefCell::new(rand::rngs::SmallRng::from_entropy());
);

const MAX_LEVELS: usize = 32;
const PROBABILITY_U8: u8 = 0x40_u8; // ~ 0.25, 255 * 0.25

fn random_level() -> usize {
    let mut level = 0;
    ZSET_RNG.with(|rng| {
        let mut r = rng.borrow_mut();
        while r.gen::<u8>() < PROBABILITY_U8 {
            level += 1;
        }
    });

    if level >= MAX_LEVELS {
        level = MAX_LEVELS - 1
    }
    level
}

type NodePointer<T> = Option<NonNull<Node<T>>>;

/// Elements ordered by `(score, element)`. The same element may be stored
/// under several scores, but an identical pair is only meaningful once; see
/// [`SkipList::contains`].
pub struct SkipList<T> {
    head: NonNull<Node<T>>,
    tail: NodePointer<T>,
    len: usize,
    highest_level: usize,
    marker: PhantomData<Box<Node<T>>>,
}

struct Level<T> {
    next: NodePointer<T>,
    span: usize,
}

struct Node<T> {
    levels: Vec<Level<T>>,
    prev: NodePointer<T>,
    element: T,
    score: f64,
}

pub struct Iter<'a, T: 'a> {
    head: NodePointer<T>,
    tail: NodePointer<T>,
    len: usize,
    marker: PhantomData<&'a Node<T>>,
}

impl<T: Debug> Debug for SkipList<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Default> Default for SkipList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Node<T> {
    fn head() -> Self {
        let mut levels = Vec::with_capacity(MAX_LEVELS);
        for _ in 0..MAX_LEVELS {
            levels.push(Level {
                next: None,
                span: 0,
            })
        }
        Node {
            levels,
            prev: None,
            element: T::default(),
            score: 0.0,
        }
    }
}

impl<T> Node<T> {
    fn new(element: T, score: f64, level: usize) -> Self {
        let mut levels = Vec::with_capacity(level + 1);
        for _ in 0..=level {
            levels.push(Level {
                next: None,
                span: 0,
            })
        }
        Node {
            levels,
            prev: None,
            element,
            score,
        }
    }
}

/// Per level predecessors of an insertion or deletion point, with the rank
/// (number of nodes passed) at each of them.
struct Search<T> {
    update: [NodePointer<T>; MAX_LEVELS],
    rank: [usize; MAX_LEVELS],
}

impl<T> Search<T> {
    fn node(&self) -> NodePointer<T> {
        self.update[0].and_then(|head| unsafe { (&(*head.as_ptr()).levels)[0].next })
    }
}

impl<T> SkipList<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            head: (unsafe { self.head.as_ref() }).levels[0].next,
            tail: self.tail,
            len: self.len,
            marker: PhantomData,
        }
    }

    fn pop_head_node(&mut self) -> Option<Box<Node<T>>> {
        let search = Search {
            update: [Some(self.head); MAX_LEVELS],
            rank: [0; MAX_LEVELS],
        };
        if let Some(node) = search.node() {
            self.delete_node(&search, node);
            return Some(unsafe { Box::from_raw(node.as_ptr()) });
        }
        None
    }

    fn delete_node(&mut self, search: &Search<T>, node: NonNull<Node<T>>) {
        unsafe {
            for l in (0..=self.highest_level).rev() {
                if let Some(update_level) = search.update[l] {
                    let update_level = &mut (&mut (*update_level.as_ptr()).levels)[l];
                    if update_level.next == Some(node) {
                        update_level.span += (&(*node.as_ptr()).levels)[l].span;
                        update_level.next = (&(*node.as_ptr()).levels)[l].next;
                    }
                    update_level.span -= 1;
                }
            }
            if let Some(next) = (&(*node.as_ptr()).levels)[0].next {
                (*next.as_ptr()).prev = (*node.as_ptr()).prev;
            } else {
                self.tail = (*node.as_ptr()).prev;
            }
            while self.highest_level > 0
                && self.head.as_ref().levels[self.highest_level].next.is_none()
            {
                self.highest_level -= 1;
            }
            self.len -= 1;
        }
    }

    /// Walks down from the highest level, advancing at each level while
    /// `before` holds for the next node.
    fn walk<F: Fn(&Node<T>) -> bool>(&self, before: F) -> Search<T> {
        let mut update: [NodePointer<T>; MAX_LEVELS] = [None; MAX_LEVELS];
        let mut rank: [usize; MAX_LEVELS] = [0; MAX_LEVELS];
        let mut head = self.head;
        for l in (0..=self.highest_level).rev() {
            rank[l] = if l == self.highest_level {
                0
            } else {
                rank[l + 1]
            };
            loop {
                let level = unsafe { &(&(*head.as_ptr()).levels)[l] };
                if let Some(next) = level.next {
                    if before(unsafe { next.as_ref() }) {
                        rank[l] += level.span;
                        head = next;
                        continue;
                    }
                }
                break;
            }
            update[l] = Some(head);
        }
        Search { update, rank }
    }
}

impl<T: Default> SkipList<T> {
    pub fn new() -> Self {
        let head = Box::new(Node::head());
        SkipList {
            head: Box::leak(head).into(),
            tail: None,
            len: 0,
            highest_level: 0,
            marker: PhantomData,
        }
    }
}

impl<T: PartialOrd> SkipList<T> {
    pub fn insert(&mut self, elt: T, score: f64) {
        let mut insertion = self.search(&elt, score);
        let level = random_level();
        if level > self.highest_level {
            for l in self.highest_level + 1..=level {
                insertion.rank[l] = 0;
                insertion.update[l] = Some(self.head);
                unsafe {
                    (&mut (*self.head.as_ptr()).levels)[l].span = self.len;
                };
            }
            self.highest_level = level;
        }
        let node: NonNull<Node<T>> = Box::leak(Box::new(Node::new(elt, score, level))).into();
        unsafe {
            for (l, insert_level) in (*node.as_ptr()).levels.iter_mut().enumerate() {
                if let Some(update_level) = insertion.update[l] {
                    let update_level = &mut (&mut (*update_level.as_ptr()).levels)[l];
                    insert_level.next = update_level.next;
                    update_level.next = Some(node);
                    let delta_span = insertion.rank[0] - insertion.rank[l];
                    insert_level.span = update_level.span - delta_span;
                    update_level.span = delta_span + 1;
                }
            }
            for l in (level + 1)..=self.highest_level {
                if let Some(update_level) = insertion.update[l] {
                    (&mut (*update_level.as_ptr()).levels)[l].span += 1;
                }
            }
            (*node.as_ptr()).prev = if insertion.update[0] == Some(self.head) {
                None
            } else {
                insertion.update[0]
            };

            if let Some(next) = (&(*node.as_ptr()).levels)[0].next {
                (*next.as_ptr()).prev = Some(node);
            } else {
                self.tail = Some(node);
            }
        }

        self.len += 1;
    }

    pub fn contains(&self, elt: &T, score: f64) -> bool {
        match self.search(elt, score).node() {
            Some(node) => {
                let node = unsafe { node.as_ref() };
                node.score == score && node.element == *elt
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn delete(&mut self, elt: &T, score: f64) -> bool {
        let search = self.search(elt, score);
        if let Some(node) = search.node() {
            let node_ref = unsafe { node.as_ref() };
            if node_ref.score == score && node_ref.element == *elt {
                self.delete_node(&search, node);
                drop(unsafe { Box::from_raw(node.as_ptr()) });
                return true;
            }
        }
        false
    }

    /// Removes every element whose score lies in `range`, returning how many
    /// were removed.
    pub fn delete_range_by_score<R: RangeBounds<f64>>(&mut self, range: R) -> usize {
        if range.is_empty() {
            return 0;
        }
        let search = self.walk(|node| range.starts_after(node.score));
        let mut removed = 0;
        while let Some(node) = search.node() {
            if range.ends_before(unsafe { node.as_ref() }.score) {
                break;
            }
            self.delete_node(&search, node);
            drop(unsafe { Box::from_raw(node.as_ptr()) });
            removed += 1;
        }
        removed
    }

    pub fn count_in_range<R: RangeBounds<f64>>(&self, range: R) -> usize {
        match (self.first_in_range(&range), self.last_in_range(&range)) {
            (Some(first), Some(last)) if last >= first => last - first + 1,
            _ => 0,
        }
    }

    /// Zero based rank of the first node inside `range`.
    fn first_in_range<R: RangeBounds<f64>>(&self, range: &R) -> Option<usize> {
        if range.is_empty() {
            return None;
        }
        let search = self.walk(|node| range.starts_after(node.score));
        let node = search.node()?;
        if range.ends_before(unsafe { node.as_ref() }.score) {
            return None;
        }
        Some(search.rank[0])
    }

    /// Zero based rank of the last node inside `range`.
    fn last_in_range<R: RangeBounds<f64>>(&self, range: &R) -> Option<usize> {
        if range.is_empty() {
            return None;
        }
        let search = self.walk(|node| !range.ends_before(node.score));
        let last = search.update[0]?;
        if last == self.head || range.starts_after(unsafe { last.as_ref() }.score) {
            return None;
        }
        Some(search.rank[0] - 1)
    }

    fn search(&self, elt: &T, score: f64) -> Search<T> {
        self.walk(|node| node.score < score || node.score == score && node.element < *elt)
    }
}

impl<T> Drop for SkipList<T> {
    fn drop(&mut self) {
        struct DropGuard<'a, T>(&'a mut SkipList<T>);

        impl<'a, T> Drop for DropGuard<'a, T> {
            fn drop(&mut self) {
                // Continue the same loop we do below. This only runs when a destructor has
                // panicked. If another one panics this will abort.
                while self.0.pop_head_node().is_some() {}
                unsafe { free_head(self.0.head) };
            }
        }

        while let Some(node) = self.pop_head_node() {
            let guard = DropGuard(self);
            drop(node);
            mem::forget(guard);
        }
        unsafe { free_head(self.head) };
    }
}

// the head carries a placeholder element that is never handed out, so it is
// forgotten rather than dropped
unsafe fn free_head<T>(head: NonNull<Node<T>>) {
    let Node {
        levels, element, ..
    } = *Box::from_raw(head.as_ptr());
    mem::forget(element);
    drop(levels);
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (f64, &'a T);

    #[inline]
    fn next(&mut self) -> Option<(f64, &'a T)> {
        if self.len == 0 {
            None
        } else {
            self.head.map(|node| unsafe {
                // Need an unbound lifetime to get 'a
                let node = &*node.as_ptr();
                self.len -= 1;
                self.head = node.levels[0].next;
                (node.score, &node.element)
            })
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    #[inline]
    fn last(mut self) -> Option<(f64, &'a T)> {
        self.next_back()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<(f64, &'a T)> {
        if self.len == 0 {
            None
        } else {
            self.tail.map(|node| unsafe {
                // Need an unbound lifetime to get 'a
                let node = &*node.as_ptr();
                self.len -= 1;
                self.tail = node.prev;
                (node.score, &node.element)
            })
        }
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

trait ScoreRange {
    fn is_empty(&self) -> bool;
    fn starts_after(&self, score: f64) -> bool;
    fn ends_before(&self, score: f64) -> bool;
}

impl<T: RangeBounds<f64>> ScoreRange for T {
    fn is_empty(&self) -> bool {
        let (min, minex) = match self.start_bound() {
            Included(start) => (start, false),
            Excluded(start) => (start, true),
            Unbounded => (&f64::NEG_INFINITY, false),
        };
        let (max, maxex) = match self.end_bound() {
            Included(end) => (end, false),
            Excluded(end) => (end, true),
            Unbounded => (&f64::INFINITY, false),
        };
        (min > max) || (min == max && (minex || maxex))
    }

    fn starts_after(&self, score: f64) -> bool {
        match self.start_bound() {
            Included(start) => start > &score,
            Excluded(start) => start >= &score,
            Unbounded => false,
        }
    }

    fn ends_before(&self, score: f64) -> bool {
        match self.end_bound() {
            Included(end) => end < &score,
            Excluded(end) => end <= &score,
            Unbounded => false,
        }
    }
}
