//! One per-kind object store: slots, reference counts and a free queue.

use std::collections::VecDeque;

use garply_ir::{Handle, Type};

use super::HeapError;

/// Count given to a pinned sentinel slot. Never reaches zero in practice and
/// is never touched by retain/release anyway.
const PINNED_COUNT: u32 = u32::MAX / 2;

pub(super) struct Store<T> {
    kind: Type,
    /// `None` marks a released slot waiting on the free queue.
    slots: Vec<Option<T>>,
    counts: Vec<u32>,
    free: VecDeque<u32>,
    has_sentinel: bool,
}

/// Outcome of dropping one reference.
pub(super) enum Release<T> {
    /// Other references remain (or the slot is pinned).
    Retained,
    /// The count reached zero; the slot is cleared and queued for reuse.
    Freed(T),
}

impl<T> Store<T> {
    pub(super) fn new(kind: Type) -> Self {
        Store {
            kind,
            slots: Vec::new(),
            counts: Vec::new(),
            free: VecDeque::new(),
            has_sentinel: false,
        }
    }

    /// Store whose slot 0 holds a permanently pinned `sentinel`.
    pub(super) fn with_sentinel(kind: Type, sentinel: T) -> Self {
        Store {
            kind,
            slots: vec![Some(sentinel)],
            counts: vec![PINNED_COUNT],
            free: VecDeque::new(),
            has_sentinel: true,
        }
    }

    #[inline]
    pub(super) fn kind(&self) -> Type {
        self.kind
    }

    #[inline]
    fn is_pinned(&self, handle: Handle) -> bool {
        self.has_sentinel && handle.is_sentinel()
    }

    fn dangling(&self, handle: Handle) -> HeapError {
        HeapError::DanglingHandle {
            kind: self.kind,
            index: handle.raw(),
        }
    }

    /// Place `item` in a recycled slot if one is queued, else append.
    /// The new slot starts with a count of zero.
    pub(super) fn insert(&mut self, item: T) -> Result<Handle, HeapError> {
        if let Some(index) = self.free.pop_front() {
            let slot = index as usize;
            self.slots[slot] = Some(item);
            self.counts[slot] = 0;
            tracing::trace!(kind = %self.kind, index, "reused heap slot");
            return Ok(Handle::new(index));
        }
        let index = u32::try_from(self.slots.len())
            .map_err(|_| HeapError::StoreFull { kind: self.kind })?;
        self.slots.push(Some(item));
        self.counts.push(0);
        Ok(Handle::new(index))
    }

    pub(super) fn get(&self, handle: Handle) -> Result<&T, HeapError> {
        self.slots
            .get(handle.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| self.dangling(handle))
    }

    /// Current count of a live slot.
    pub(super) fn count(&self, handle: Handle) -> Option<u32> {
        match self.slots.get(handle.index()) {
            Some(Some(_)) => self.counts.get(handle.index()).copied(),
            _ => None,
        }
    }

    pub(super) fn retain(&mut self, handle: Handle) -> Result<(), HeapError> {
        if self.is_pinned(handle) {
            return Ok(());
        }
        self.get(handle)?;
        let count = &mut self.counts[handle.index()];
        *count = count.checked_add(1).ok_or(HeapError::RefcountOverflow {
            kind: self.kind,
            index: handle.raw(),
        })?;
        Ok(())
    }

    pub(super) fn release(&mut self, handle: Handle) -> Result<Release<T>, HeapError> {
        if self.is_pinned(handle) {
            return Ok(Release::Retained);
        }
        self.get(handle)?;
        let slot = handle.index();
        let Some(remaining) = self.counts[slot].checked_sub(1) else {
            return Err(HeapError::RefcountUnderflow {
                kind: self.kind,
                index: handle.raw(),
            });
        };
        self.counts[slot] = remaining;
        if remaining > 0 {
            return Ok(Release::Retained);
        }
        let item = self.slots[slot].take().ok_or_else(|| self.dangling(handle))?;
        self.free.push_back(handle.raw());
        tracing::trace!(kind = %self.kind, index = handle.raw(), "released heap slot");
        Ok(Release::Freed(item))
    }

    /// Live slots, sentinel excluded.
    pub(super) fn live_count(&self) -> usize {
        let live = self.slots.iter().filter(|slot| slot.is_some()).count();
        live - usize::from(self.has_sentinel)
    }

    /// Every slot in index order: handle, count, contents, queued-for-reuse.
    pub(super) fn slots(&self) -> impl Iterator<Item = (Handle, u32, Option<&T>, bool)> + '_ {
        self.slots
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(move |(i, (slot, &count))| {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "slot count is bounded by u32 in insert"
                )]
                let index = i as u32;
                (
                    Handle::new(index),
                    count,
                    slot.as_ref(),
                    self.free.contains(&index),
                )
            })
    }
}
