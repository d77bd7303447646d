//! Intrusive doubly-linked lists over the entry arena
//!
//! A `ListHead` only stores the two ends; the neighbor links live in the
//! entries themselves (see `entry::Link`). The same code threads both the
//! per-bucket hash chains and the global recency list, selected by
//! `Linkage`.

use crate::entry::{FlowArena, FlowIndex, Linkage};

/// Ends of one intrusive list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListHead {
    pub first: Option<FlowIndex>,
    pub last: Option<FlowIndex>,
}

impl ListHead {
    /// Create an empty list
    pub const fn new() -> Self {
        Self { first: None, last: None }
    }

    /// Whether the list has no members
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Link `idx` in front of the current first member
    pub fn push_front<R>(&mut self, arena: &mut FlowArena<R>, which: Linkage, idx: FlowIndex) {
        let old_first = self.first;
        if let Some(entry) = arena.get_mut(idx) {
            let link = entry.link_mut(which);
            link.prev = None;
            link.next = old_first;
        }
        match old_first.and_then(|first| arena.get_mut(first)) {
            Some(first) => first.link_mut(which).prev = Some(idx),
            None => self.last = Some(idx),
        }
        self.first = Some(idx);
    }

    /// Unlink `idx`, which must currently be a member of this list
    pub fn unlink<R>(&mut self, arena: &mut FlowArena<R>, which: Linkage, idx: FlowIndex) {
        let Some(entry) = arena.get_mut(idx) else {
            return;
        };
        let link = core::mem::take(entry.link_mut(which));

        match link.prev.and_then(|prev| arena.get_mut(prev)) {
            Some(prev) => prev.link_mut(which).next = link.next,
            None => self.first = link.next,
        }
        match link.next.and_then(|next| arena.get_mut(next)) {
            Some(next) => next.link_mut(which).prev = link.prev,
            None => self.last = link.prev,
        }
    }

    /// Member after `idx`
    pub fn next<R>(arena: &FlowArena<R>, which: Linkage, idx: FlowIndex) -> Option<FlowIndex> {
        arena.get(idx).and_then(|entry| entry.link(which).next)
    }

    /// Walk the members front to back
    pub fn iter<'a, R>(&self, arena: &'a FlowArena<R>, which: Linkage) -> ListIter<'a, R> {
        ListIter { arena, which, cursor: self.first }
    }
}

/// Iterator over the indices of a list
pub struct ListIter<'a, R> {
    arena: &'a FlowArena<R>,
    which: Linkage,
    cursor: Option<FlowIndex>,
}

impl<R> Iterator for ListIter<'_, R> {
    type Item = FlowIndex;

    fn next(&mut self) -> Option<FlowIndex> {
        let idx = self.cursor?;
        self.cursor = ListHead::next(self.arena, self.which, idx);
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use crate::entry::FlowEntry;
    use crate::test_support::{key, TestRoute};

    fn arena_with(n: u16) -> (FlowArena<TestRoute>, Vec<FlowIndex>) {
        let mut arena = FlowArena::new();
        let mut indices = Vec::new();
        for i in 0..n {
            let (route, _) = TestRoute::new(1500);
            arena.reserve_slot().unwrap();
            indices.push(arena.insert(FlowEntry::new(key(i), route, 10)));
        }
        (arena, indices)
    }

    #[test]
    fn test_push_front_order() {
        let (mut arena, idx) = arena_with(3);
        let mut list = ListHead::new();
        for &i in &idx {
            list.push_front(&mut arena, Linkage::Recency, i);
        }
        let order: Vec<_> = list.iter(&arena, Linkage::Recency).collect();
        assert_eq!(order, [idx[2], idx[1], idx[0]]);
        assert_eq!(list.first, Some(idx[2]));
        assert_eq!(list.last, Some(idx[0]));
    }

    #[test]
    fn test_unlink_middle_and_ends() {
        let (mut arena, idx) = arena_with(4);
        let mut list = ListHead::new();
        for &i in &idx {
            list.push_front(&mut arena, Linkage::Recency, i);
        }

        list.unlink(&mut arena, Linkage::Recency, idx[1]);
        let order: Vec<_> = list.iter(&arena, Linkage::Recency).collect();
        assert_eq!(order, [idx[3], idx[2], idx[0]]);

        list.unlink(&mut arena, Linkage::Recency, idx[3]);
        list.unlink(&mut arena, Linkage::Recency, idx[0]);
        assert_eq!(list.first, Some(idx[2]));
        assert_eq!(list.last, Some(idx[2]));

        list.unlink(&mut arena, Linkage::Recency, idx[2]);
        assert!(list.is_empty());
        assert_eq!(list.last, None);
    }

    #[test]
    fn test_lists_are_independent() {
        let (mut arena, idx) = arena_with(2);
        let mut chain = ListHead::new();
        let mut recency = ListHead::new();
        chain.push_front(&mut arena, Linkage::Chain, idx[0]);
        chain.push_front(&mut arena, Linkage::Chain, idx[1]);
        recency.push_front(&mut arena, Linkage::Recency, idx[1]);
        recency.push_front(&mut arena, Linkage::Recency, idx[0]);

        chain.unlink(&mut arena, Linkage::Chain, idx[1]);
        let chain_order: Vec<_> = chain.iter(&arena, Linkage::Chain).collect();
        let recency_order: Vec<_> = recency.iter(&arena, Linkage::Recency).collect();
        assert_eq!(chain_order, [idx[0]]);
        assert_eq!(recency_order, [idx[0], idx[1]]);
    }
}
