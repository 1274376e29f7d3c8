//! The object heap: four per-kind stores under manual reference counting.
//!
//! # Ownership Protocol
//!
//! - `allocate_*` returns a handle to a slot with count zero. The caller
//!   performs the first [`Heap::add_ref`].
//! - Every retained copy of a handle is one `add_ref`; every drop is one
//!   [`Heap::remove_ref`].
//! - Constructors that store other values (tuples, list cells) take over one
//!   reference to each stored value rather than adding their own.
//! - When a count reaches zero the slot is cleared, its index is queued for
//!   reuse and everything it held is released in turn. Tuple slot 0 and list
//!   slot 0 are pinned empty sentinels and are never released.
//!
//! Objects are immutable once built; only counts change.
//!
//! Each session owns its heap outright. There is no global heap and no
//! locking.

mod dump;
mod store;

use garply_ir::{Expression, Handle, Instruction, Type, TypeBits, Value};
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

pub use dump::{DumpSection, HeapDump, SlotDump};
use store::{Release, Store};

/// Items of one tuple.
pub type TupleItems = SmallVec<[Value; 4]>;

/// Misuse of a handle. Always a bug in the caller's retain/release
/// bookkeeping, never a property of the program being run.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    #[error("dangling {kind} handle {index}")]
    DanglingHandle { kind: Type, index: u32 },
    #[error("reference count underflow on {kind} slot {index}")]
    RefcountUnderflow { kind: Type, index: u32 },
    #[error("reference count overflow on {kind} slot {index}")]
    RefcountOverflow { kind: Type, index: u32 },
    #[error("{kind} store is full")]
    StoreFull { kind: Type },
}

/// One cons cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ListCell {
    pub head: Value,
    pub tail: Handle,
}

pub struct Heap {
    strings: Store<Box<str>>,
    tuples: Store<TupleItems>,
    lists: Store<ListCell>,
    expressions: Store<Expression>,
    /// Persistent strings by content hash.
    interned: FxHashMap<u64, Handle>,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            strings: Store::new(Type::String),
            tuples: Store::with_sentinel(Type::Tuple, TupleItems::new()),
            lists: Store::with_sentinel(
                Type::List,
                ListCell {
                    head: Value::Error,
                    tail: Handle::SENTINEL,
                },
            ),
            expressions: Store::new(Type::Expression),
            interned: FxHashMap::default(),
        }
    }

    // Allocation

    /// Allocate a fresh string slot, even if identical text is already live.
    pub fn allocate_string(&mut self, text: impl Into<Box<str>>) -> Result<Value, HeapError> {
        self.strings.insert(text.into()).map(Value::String)
    }

    /// Allocate a string interned by content hash.
    ///
    /// A live slot with the same hash is returned as is; its stored text is
    /// not compared, so two texts with colliding hashes share a slot.
    pub fn allocate_persistent_string(&mut self, text: &str) -> Result<Value, HeapError> {
        let key = content_hash(text);
        if let Some(&handle) = self.interned.get(&key) {
            tracing::trace!(index = handle.raw(), "persistent string hit");
            return Ok(Value::String(handle));
        }
        let handle = self.strings.insert(text.into())?;
        self.interned.insert(key, handle);
        Ok(Value::String(handle))
    }

    /// Allocate a tuple. Takes over one reference to each item.
    pub fn allocate_tuple(
        &mut self,
        items: impl IntoIterator<Item = Value>,
    ) -> Result<Value, HeapError> {
        self.tuples.insert(items.into_iter().collect()).map(Value::Tuple)
    }

    /// Allocate a cons cell. Takes over one reference to `head` and `tail`.
    pub fn allocate_list(&mut self, head: Value, tail: Handle) -> Result<Value, HeapError> {
        self.lists.get(tail)?;
        self.lists.insert(ListCell { head, tail }).map(Value::List)
    }

    /// Build a list holding `items` in order. Takes over one reference to
    /// each item; the returned head cell has count zero like any allocation.
    pub fn allocate_list_from<I>(&mut self, items: I) -> Result<Value, HeapError>
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut list = Value::EMPTY_LIST;
        for item in items.into_iter().rev() {
            // The new cell owns the previous one.
            self.add_ref(list)?;
            let tail = list.handle().unwrap_or(Handle::SENTINEL);
            list = self.allocate_list(item, tail)?;
        }
        Ok(list)
    }

    pub fn allocate_expression(
        &mut self,
        result_type: TypeBits,
        instructions: Vec<Instruction>,
    ) -> Result<Value, HeapError> {
        self.allocate_expression_from(Expression::new(result_type, instructions))
    }

    /// Store an expression. Operands are inert data; nothing is retained.
    pub fn allocate_expression_from(&mut self, expression: Expression) -> Result<Value, HeapError> {
        self.expressions.insert(expression).map(Value::Expression)
    }

    // Reference counting

    /// Record one more retained copy of `value`. No-op for inline values and
    /// the pinned sentinels.
    pub fn add_ref(&mut self, value: Value) -> Result<(), HeapError> {
        match value {
            Value::String(h) => self.strings.retain(h),
            Value::Tuple(h) => self.tuples.retain(h),
            Value::List(h) => self.lists.retain(h),
            Value::Expression(h) => self.expressions.retain(h),
            _ => Ok(()),
        }
    }

    /// Drop one retained copy of `value`, cascading through everything a
    /// freed object held.
    ///
    /// Uses a work list rather than recursion, so long list tails and deep
    /// tuple nesting release in constant stack space.
    pub fn remove_ref(&mut self, value: Value) -> Result<(), HeapError> {
        let mut pending: SmallVec<[Value; 8]> = smallvec![value];
        while let Some(value) = pending.pop() {
            match value {
                Value::String(h) => {
                    if let Release::Freed(text) = self.strings.release(h)? {
                        self.forget_interned(h, &text);
                    }
                }
                Value::Tuple(h) => {
                    if let Release::Freed(items) = self.tuples.release(h)? {
                        pending.extend(items);
                    }
                }
                Value::List(h) => {
                    if let Release::Freed(cell) = self.lists.release(h)? {
                        pending.push(Value::List(cell.tail));
                        pending.push(cell.head);
                    }
                }
                Value::Expression(h) => {
                    self.expressions.release(h)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn forget_interned(&mut self, handle: Handle, text: &str) {
        let key = content_hash(text);
        if self.interned.get(&key) == Some(&handle) {
            self.interned.remove(&key);
        }
    }

    // Access

    pub fn string(&self, handle: Handle) -> Result<&str, HeapError> {
        self.strings.get(handle).map(AsRef::as_ref)
    }

    pub fn tuple(&self, handle: Handle) -> Result<&[Value], HeapError> {
        self.tuples.get(handle).map(SmallVec::as_slice)
    }

    pub fn list(&self, handle: Handle) -> Result<ListCell, HeapError> {
        self.lists.get(handle).copied()
    }

    pub fn expression(&self, handle: Handle) -> Result<&Expression, HeapError> {
        self.expressions.get(handle)
    }

    /// Count of the slot `value` names; `None` for inline values and
    /// released slots.
    pub fn ref_count(&self, value: Value) -> Option<u32> {
        match value {
            Value::String(h) => self.strings.count(h),
            Value::Tuple(h) => self.tuples.count(h),
            Value::List(h) => self.lists.count(h),
            Value::Expression(h) => self.expressions.count(h),
            _ => None,
        }
    }

    /// Live objects of one reference kind, sentinels excluded.
    pub fn live_count(&self, kind: Type) -> usize {
        match kind {
            Type::String => self.strings.live_count(),
            Type::Tuple => self.tuples.live_count(),
            Type::List => self.lists.live_count(),
            Type::Expression => self.expressions.live_count(),
            _ => 0,
        }
    }

    /// Live objects across all kinds.
    pub fn total_live(&self) -> usize {
        [Type::String, Type::Tuple, Type::List, Type::Expression]
            .into_iter()
            .map(|kind| self.live_count(kind))
            .sum()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

/// 64-bit content hash over UTF-16 code units.
fn content_hash(text: &str) -> u64 {
    const SEED: u64 = 0x542c_2caa_6d87_70ef;
    const PRIME: u64 = 1_251_953;
    text.encode_utf16()
        .fold(SEED, |hash, unit| hash.wrapping_mul(PRIME) ^ u64::from(unit))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
