//! Runtime values.
//!
//! A [`Value`] is a kind tag plus a 64-bit payload. Inline kinds carry their
//! datum directly; reference kinds carry a [`Handle`] into the matching store
//! of the evaluator's heap. Copying a `Value` never touches reference counts,
//! the heap owner decides when a copy counts as a retained reference.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Opcode, Type, TypeBits};

/// Slot index into one of the heap's per-kind stores.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Slot 0 of the list and tuple stores: the pinned empty sentinel.
    pub const SENTINEL: Handle = Handle(0);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Handle(index)
    }

    /// Index into the store.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// A tagged runtime datum.
///
/// Equality is tag plus payload: two handles are equal only if they name the
/// same slot, and floats compare by bit pattern.
#[derive(Copy, Clone, Debug, Default)]
pub enum Value {
    /// The error sentinel (zero tag, zero payload).
    #[default]
    Error,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// A type tag.
    Type(TypeBits),
    Opcode(Opcode),
    String(Handle),
    Tuple(Handle),
    List(Handle),
    Expression(Handle),
}

impl Value {
    /// The empty-list sentinel.
    pub const EMPTY_LIST: Value = Value::List(Handle::SENTINEL);

    /// The empty-tuple sentinel.
    pub const EMPTY_TUPLE: Value = Value::Tuple(Handle::SENTINEL);

    /// A `Type` value naming `ty`.
    #[inline]
    pub const fn of_type(ty: Type) -> Self {
        Value::Type(ty.bits())
    }

    /// The static kind of this value.
    ///
    /// Handles report their store's kind, never a per-instance subtype.
    pub const fn ty(&self) -> Type {
        match self {
            Value::Error => Type::Error,
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Float(_) => Type::Float,
            Value::Type(_) => Type::Type,
            Value::Opcode(_) => Type::Opcode,
            Value::String(_) => Type::String,
            Value::Tuple(_) => Type::Tuple,
            Value::List(_) => Type::List,
            Value::Expression(_) => Type::Expression,
        }
    }

    /// The 64-bit payload.
    pub fn raw_payload(&self) -> u64 {
        match *self {
            Value::Error => 0,
            Value::Boolean(b) => u64::from(b),
            Value::Integer(n) => u64::from_le_bytes(n.to_le_bytes()),
            Value::Float(x) => x.to_bits(),
            Value::Type(bits) => u64::from(bits.bits()),
            Value::Opcode(opcode) => u64::from(opcode.code()),
            Value::String(h) | Value::Tuple(h) | Value::List(h) | Value::Expression(h) => {
                u64::from(h.raw())
            }
        }
    }

    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, Value::Error)
    }

    /// The heap handle, for reference kinds.
    #[inline]
    pub const fn handle(&self) -> Option<Handle> {
        match *self {
            Value::String(h) | Value::Tuple(h) | Value::List(h) | Value::Expression(h) => Some(h),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_type_bits(&self) -> Option<TypeBits> {
        match *self {
            Value::Type(bits) => Some(bits),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.ty() == other.ty() && self.raw_payload() == other.raw_payload()
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty().hash(state);
        self.raw_payload().hash(state);
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Type> for Value {
    #[inline]
    fn from(ty: Type) -> Self {
        Value::of_type(ty)
    }
}

impl From<Opcode> for Value {
    #[inline]
    fn from(opcode: Opcode) -> Self {
        Value::Opcode(opcode)
    }
}

/// Heap-free rendering. Handles print as `kind#index`; the evaluator's heap
/// provides the content-aware form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Error => f.write_str("#Error#"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Type(bits) => write!(f, "<{bits}>"),
            Value::Opcode(opcode) => write!(f, "|{opcode}|"),
            Value::String(h) | Value::Tuple(h) | Value::List(h) | Value::Expression(h) => {
                write!(f, "{}#{}", self.ty().name(), h.raw())
            }
        }
    }
}

#[cfg(test)]
mod tests;
