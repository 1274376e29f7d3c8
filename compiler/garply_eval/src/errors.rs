//! Unrecoverable evaluation faults.
//!
//! These mean the session's collaborators disagree with the program (a
//! string id the database never issued, a variable slot past the scope the
//! caller built) or the heap bookkeeping is broken. They abort the
//! evaluation with `Err` and leave the session in an unspecified state.
//! Program-level faults are queued as diagnostics instead, see
//! [`crate::diagnostics`].

use garply_ir::Opcode;
use thiserror::Error;

use crate::heap::HeapError;
use crate::scope::ScopeError;

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalFault {
    /// A direct [`allocate_tuple`](crate::ExecutionContext::allocate_tuple)
    /// call asked for more values than the stack holds.
    #[error("{opcode} popped from an empty operand stack")]
    StackUnderflow { opcode: Opcode },
    #[error("string id {0} is not registered")]
    UnknownString(u32),
    #[error("variable index {index} out of range for scope of {len}")]
    VariableOutOfRange { index: u16, len: usize },
    #[error(transparent)]
    Heap(#[from] HeapError),
}

impl From<ScopeError> for EvalFault {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::OutOfRange { index, len } => EvalFault::VariableOutOfRange { index, len },
            ScopeError::Heap(err) => EvalFault::Heap(err),
        }
    }
}
