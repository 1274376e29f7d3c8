//! Per-session evaluation state.

use garply_ir::{Opcode, Value};

use crate::diagnostics::ErrorContext;
use crate::errors::EvalFault;
use crate::heap::{Heap, HeapError};
use crate::scope::{Scope, ScopeBuilder, ScopeError};
use crate::strings::{MetadataDatabase, StringDatabase};

/// Evaluation limits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Operand stack slots reserved up front.
    pub stack_capacity: usize,
    /// How many `EvaluateExpression` frames may nest.
    pub max_meta_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            stack_capacity: 64,
            max_meta_depth: 256,
        }
    }
}

/// Operand stack. Every value on it owns one reference.
#[derive(Debug, Default)]
pub struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub fn with_capacity(capacity: usize) -> Self {
        OperandStack {
            values: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values bottom to top.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

/// Everything one session evaluates against: its heap, operand stack,
/// variables, queued diagnostics and string literals.
///
/// Sessions share nothing. Two contexts are two independent heaps.
pub struct ExecutionContext<M: MetadataDatabase = StringDatabase> {
    pub heap: Heap,
    pub scope: Scope,
    pub errors: ErrorContext,
    pub database: M,
    pub(crate) stack: OperandStack,
    pub(crate) options: EvalOptions,
    /// Enclosing `EvaluateExpression` frames.
    pub(crate) meta_depth: usize,
    /// Stack depth at entry to the innermost running expression. Nothing
    /// below it may be popped.
    pub(crate) frame_base: usize,
}

impl ExecutionContext<StringDatabase> {
    pub fn new() -> Self {
        Self::with_database(StringDatabase::new(), EvalOptions::default())
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Self::with_database(StringDatabase::new(), options)
    }
}

impl Default for ExecutionContext<StringDatabase> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MetadataDatabase> ExecutionContext<M> {
    pub fn with_database(database: M, options: EvalOptions) -> Self {
        ExecutionContext {
            heap: Heap::new(),
            scope: Scope::default(),
            errors: ErrorContext::new(),
            database,
            stack: OperandStack::with_capacity(options.stack_capacity),
            options,
            meta_depth: 0,
            frame_base: 0,
        }
    }

    #[inline]
    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Push a value whose reference the stack now owns.
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop a value; the caller takes over its reference.
    #[inline]
    pub fn pop(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// Values pushed since the innermost running expression started.
    #[inline]
    pub(crate) fn frame_len(&self) -> usize {
        self.stack.len().saturating_sub(self.frame_base)
    }

    /// Pop `arity` values into a new tuple, first popped first.
    ///
    /// The tuple takes over the popped references. The returned handle has
    /// count zero. Values below the running expression's frame are off limits.
    pub fn allocate_tuple(&mut self, arity: usize) -> Result<Value, EvalFault> {
        if self.frame_len() < arity {
            return Err(EvalFault::StackUnderflow {
                opcode: Opcode::NewTuple,
            });
        }
        let split = self.stack.len() - arity;
        let items = self.stack.values.drain(split..).rev();
        Ok(self.heap.allocate_tuple(items)?)
    }

    /// Release one reference to `value`.
    #[inline]
    pub fn release(&mut self, value: Value) -> Result<(), HeapError> {
        self.heap.remove_ref(value)
    }

    /// Pop and release until the stack is `depth` deep.
    pub(crate) fn unwind_to(&mut self, depth: usize) -> Result<(), HeapError> {
        while self.stack.len() > depth {
            if let Some(value) = self.stack.pop() {
                self.heap.remove_ref(value)?;
            }
        }
        Ok(())
    }

    /// Widen the scope to every variable `builder` knows, keeping bindings.
    ///
    /// A no-op while the scope is already wide enough.
    pub fn resize_scope(&mut self, builder: &ScopeBuilder) -> Result<(), ScopeError> {
        if builder.len() <= self.scope.len() {
            return Ok(());
        }
        let wider = self.scope.copy(&mut self.heap, builder)?;
        let mut old = std::mem::replace(&mut self.scope, wider);
        old.delete(&mut self.heap)?;
        Ok(())
    }

    /// Drain queued diagnostics into a heap list, see
    /// [`ErrorContext::take_errors`].
    pub fn take_errors(&mut self) -> Result<Value, HeapError> {
        self.errors.take_errors(&mut self.heap)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use garply_ir::Type;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::scope::Mutability;

    #[test]
    fn allocate_tuple_uses_pop_order() {
        let mut ctx = ExecutionContext::new();
        ctx.push(Value::Integer(3));
        ctx.push(Value::Integer(4));
        let tuple = ctx.allocate_tuple(2).unwrap();
        assert_eq!(ctx.size(), 0);
        assert_eq!(
            ctx.heap.tuple(tuple.handle().unwrap()).unwrap(),
            &[Value::Integer(4), Value::Integer(3)]
        );
    }

    #[test]
    fn allocate_tuple_underflow_leaves_stack_alone() {
        let mut ctx = ExecutionContext::new();
        ctx.push(Value::Integer(1));
        assert_eq!(
            ctx.allocate_tuple(2),
            Err(EvalFault::StackUnderflow {
                opcode: Opcode::NewTuple
            })
        );
        assert_eq!(ctx.size(), 1);
    }

    #[test]
    fn resize_scope_keeps_bindings_and_counts() {
        let mut ctx = ExecutionContext::new();
        let mut names = ScopeBuilder::new();
        names.get_or_create_index("a").unwrap();
        ctx.resize_scope(&names).unwrap();

        let text = ctx.heap.allocate_string("a").unwrap();
        ctx.scope
            .set_value(&mut ctx.heap, &mut ctx.errors, 0, text, Mutability::Immutable)
            .unwrap();

        names.get_or_create_index("b").unwrap();
        ctx.resize_scope(&names).unwrap();
        assert_eq!(ctx.scope.len(), 2);
        assert_eq!(ctx.scope.get_value(0).unwrap(), text);
        assert_eq!(ctx.heap.ref_count(text), Some(1));
        assert_eq!(ctx.heap.live_count(Type::String), 1);
    }

    #[test]
    fn default_options() {
        let options = EvalOptions::default();
        assert_eq!(options.stack_capacity, 64);
        assert_eq!(options.max_meta_depth, 256);
    }
}
