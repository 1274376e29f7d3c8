//! Garply Eval - heap, variable scopes and the stack-machine evaluator.
//!
//! # Architecture
//!
//! - [`Heap`]: four per-kind object stores under manual reference counting
//! - [`Scope`] / [`ScopeBuilder`]: dense variable slots with per-slot mutability
//! - [`ErrorContext`]: queued, recoverable diagnostics
//! - [`ExecutionContext`]: one session's heap, operand stack, scope and
//!   diagnostics, plus [`ExecutionContext::evaluate`]
//! - [`StringDatabase`]: resolves `LoadString` operand ids
//!
//! The data model (values, opcodes, instructions, the binary codec) lives in
//! `garply_ir` and is re-exported here.

mod context;
mod diagnostics;
mod display;
mod errors;
mod evaluate;
pub mod heap;
mod scope;
mod stack;
mod strings;
mod tracing_setup;

pub use garply_ir::{
    decode, encode, DecodeError, EncodeError, Expression, ExpressionBuilder, Handle, Instruction,
    Opcode, Type, TypeBits, Value,
};

pub use context::{EvalOptions, ExecutionContext, OperandStack};
pub use diagnostics::{Diagnostic, DiagnosticKind, ErrorContext};
pub use display::DisplayValue;
pub use errors::EvalFault;
pub use heap::{DumpSection, Heap, HeapDump, HeapError, ListCell, SlotDump, TupleItems};
pub use scope::{DisplayScope, Mutability, Scope, ScopeBuilder, ScopeError, TooManyVariables};
pub use stack::ensure_sufficient_stack;
pub use strings::{MetadataDatabase, StringDatabase};
pub use tracing_setup::init_tracing;
