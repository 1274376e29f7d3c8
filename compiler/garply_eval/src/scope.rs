//! Variable storage.
//!
//! Names are resolved ahead of time: a [`ScopeBuilder`] hands each new name
//! the next dense index, and instructions carry that index. The runtime
//! [`Scope`] is a fixed-width array of slots, one per index known when it was
//! built.
//!
//! An interactive session keeps declaring variables after its scope exists.
//! When the builder outgrows the live scope, the caller makes a wider one with
//! [`Scope::copy`] (which retains every binding again) and then releases the
//! old one with [`Scope::delete`].

use std::fmt;

use garply_ir::Value;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::diagnostics::{DiagnosticKind, ErrorContext};
use crate::heap::{Heap, HeapError};

/// Whether a binding may be replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

impl Mutability {
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("variable index {index} out of range for scope of {len}")]
    OutOfRange { index: u16, len: usize },
    #[error(transparent)]
    Heap(#[from] HeapError),
}

/// The builder ran out of 16-bit indices.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[error("too many variables for a 16-bit index")]
pub struct TooManyVariables;

/// Name to index assignment for one session.
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    indices: FxHashMap<Box<str>, u16>,
    names: Vec<Box<str>>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, assigning the next free one if it is new.
    pub fn get_or_create_index(&mut self, name: &str) -> Result<u16, TooManyVariables> {
        if let Some(&index) = self.indices.get(name) {
            return Ok(index);
        }
        let index = u16::try_from(self.names.len()).map_err(|_| TooManyVariables)?;
        self.indices.insert(name.into(), index);
        self.names.push(name.into());
        Ok(index)
    }

    pub fn try_get_index(&self, name: &str) -> Option<u16> {
        self.indices.get(name).copied()
    }

    pub fn name(&self, index: u16) -> Option<&str> {
        self.names.get(usize::from(index)).map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// An empty scope wide enough for every name seen so far.
    pub fn build(&self) -> Scope {
        Scope {
            slots: vec![None; self.names.len()],
            names: self.names.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Binding {
    value: Value,
    mutability: Mutability,
}

/// Dense variable slots. Each bound slot holds one reference to its value.
#[derive(Debug, Default)]
pub struct Scope {
    slots: Vec<Option<Binding>>,
    names: Vec<Box<str>>,
}

impl Scope {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, index: u16) -> Result<&Option<Binding>, ScopeError> {
        self.slots.get(usize::from(index)).ok_or(ScopeError::OutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    /// The bound value, or `Value::Error` if the slot was never assigned.
    /// Does not retain.
    pub fn get_value(&self, index: u16) -> Result<Value, ScopeError> {
        Ok(self.slot(index)?.map_or(Value::Error, |binding| binding.value))
    }

    pub fn mutability(&self, index: u16) -> Result<Option<Mutability>, ScopeError> {
        Ok(self.slot(index)?.map(|binding| binding.mutability))
    }

    /// Bind `value` to slot `index`.
    ///
    /// The first write always succeeds and fixes the slot's mutability.
    /// Later writes succeed only when both the slot and the request are
    /// mutable; the old value is released. A refused write queues
    /// [`DiagnosticKind::ImmutableRebind`], leaves the slot untouched and
    /// returns `Value::Error`.
    ///
    /// On success the scope holds its own new reference to `value`.
    pub fn set_value(
        &mut self,
        heap: &mut Heap,
        errors: &mut ErrorContext,
        index: u16,
        value: Value,
        mutability: Mutability,
    ) -> Result<Value, ScopeError> {
        let current = *self.slot(index)?;
        let slot = &mut self.slots[usize::from(index)];
        match current {
            None => {
                heap.add_ref(value)?;
                *slot = Some(Binding { value, mutability });
                Ok(value)
            }
            Some(binding) if mutability.is_mutable() && binding.mutability.is_mutable() => {
                heap.add_ref(value)?;
                heap.remove_ref(binding.value)?;
                *slot = Some(Binding {
                    value,
                    mutability: binding.mutability,
                });
                Ok(value)
            }
            Some(_) => {
                errors.add_error(DiagnosticKind::ImmutableRebind);
                Ok(Value::Error)
            }
        }
    }

    /// A scope sized to `builder` carrying every binding of this one.
    ///
    /// Bindings keep their mutability and are retained once more for the new
    /// scope; release this one afterwards with [`Scope::delete`].
    pub fn copy(&self, heap: &mut Heap, builder: &ScopeBuilder) -> Result<Scope, ScopeError> {
        let mut wider = builder.build();
        for (to, from) in wider.slots.iter_mut().zip(&self.slots) {
            if let Some(binding) = from {
                heap.add_ref(binding.value)?;
                *to = Some(*binding);
            }
        }
        tracing::debug!(from = self.len(), to = wider.len(), "grew scope");
        Ok(wider)
    }

    /// Release every binding and leave all slots unset.
    pub fn delete(&mut self, heap: &mut Heap) -> Result<(), HeapError> {
        for slot in &mut self.slots {
            if let Some(binding) = slot.take() {
                heap.remove_ref(binding.value)?;
            }
        }
        Ok(())
    }

    /// Render as `Scope[{name,value}, ...]`; unset slots show an empty value.
    pub fn display<'a>(&'a self, heap: &'a Heap) -> DisplayScope<'a> {
        DisplayScope { scope: self, heap }
    }
}

/// See [`Scope::display`].
pub struct DisplayScope<'a> {
    scope: &'a Scope,
    heap: &'a Heap,
}

impl fmt::Display for DisplayScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_empty() {
            return f.write_str("Scope[]");
        }
        f.write_str("Scope[")?;
        for (i, slot) in self.scope.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let name = self.scope.names.get(i).map_or("", AsRef::as_ref);
            write!(f, "\n  {{{name},")?;
            match slot.map(|binding| binding.value) {
                None => {}
                Some(Value::Expression(h)) => match self.heap.expression(h) {
                    Ok(expression) => write!(f, "{}", expression.short())?,
                    Err(_) => write!(f, "{}", Value::Expression(h))?,
                },
                Some(value) => write!(f, "{}", self.heap.display(value))?,
            }
            f.write_str("}")?;
        }
        f.write_str("\n]")
    }
}
