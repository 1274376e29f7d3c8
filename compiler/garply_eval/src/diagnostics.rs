//! Recoverable faults, queued as data.
//!
//! A program-level fault (an unbalanced expression, a pop past the bottom
//! of the expression's own stack frame, an operand of the wrong kind, a
//! rebind of an immutable variable, ...) does not interrupt the caller. The evaluator queues a
//! [`Diagnostic`] on the session's [`ErrorContext`] and yields
//! `Value::Error`; the caller drains the queue when it is ready to show it.

use std::collections::VecDeque;
use std::fmt;

use garply_ir::{Handle, Opcode, Type, Value};

use crate::heap::{Heap, HeapError};

/// What went wrong, with the data needed to describe it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The expression left nothing to return.
    EmptyStackOnExit,
    /// The expression's net stack effect was not exactly one.
    StackImbalance { entry: usize, exit: usize },
    ImmutableRebind,
    UnsetVariable { index: u16 },
    /// An `EvaluateExpression` target yielded the error value.
    NestedEvaluation,
    MetaDepthExceeded { limit: usize },
    /// `ListHead` or `ListTail` applied to the empty list.
    EmptyList,
    /// `opcode` needed more values than the current expression pushed.
    StackUnderflow { opcode: Opcode },
    TypeMismatch {
        opcode: Opcode,
        expected: Type,
        found: Type,
    },
    TupleIndexOutOfRange { index: usize, arity: usize },
    /// `NewExpression` item `index` is not an `(opcode, operand)` pair.
    MalformedInstruction { index: usize },
    /// The operand is not of the kind `opcode` takes, or does not fit its
    /// encoded width.
    InvalidOperand { opcode: Opcode, operand: Value },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::EmptyStackOnExit => {
                write!(f, "Invalid expression - evaluation stack was empty upon exit.")
            }
            DiagnosticKind::StackImbalance { entry, exit } => write!(
                f,
                "Invalid expression - evaluation stack size was modified. \
                 Original size: {entry}, size upon exit: {exit}."
            ),
            DiagnosticKind::ImmutableRebind => {
                write!(f, "Cannot rebind to immutable variable.")
            }
            DiagnosticKind::UnsetVariable { index } => {
                write!(f, "Variable {index} has not been assigned.")
            }
            DiagnosticKind::NestedEvaluation => {
                write!(f, "Nested expression evaluated to an error.")
            }
            DiagnosticKind::MetaDepthExceeded { limit } => {
                write!(f, "Expression nesting exceeded the limit of {limit}.")
            }
            DiagnosticKind::EmptyList => write!(f, "The empty list has no head or tail."),
            DiagnosticKind::StackUnderflow { opcode } => write!(
                f,
                "Invalid expression - {opcode} needs more values than the evaluation stack holds."
            ),
            DiagnosticKind::TypeMismatch {
                opcode,
                expected,
                found,
            } => write!(f, "{opcode} expected {expected}, found {found}."),
            DiagnosticKind::TupleIndexOutOfRange { index, arity } => write!(
                f,
                "Tuple index {index} is out of range for a tuple of arity {arity}."
            ),
            DiagnosticKind::MalformedInstruction { index } => write!(
                f,
                "Instruction {index} is not an (opcode, operand) pair."
            ),
            DiagnosticKind::InvalidOperand { opcode, operand } => {
                write!(f, "{opcode} cannot take operand {operand}.")
            }
        }
    }
}

/// One queued fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind) -> Self {
        Diagnostic { kind }
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl From<DiagnosticKind> for Diagnostic {
    fn from(kind: DiagnosticKind) -> Self {
        Diagnostic::new(kind)
    }
}

/// FIFO queue of diagnostics for one session.
#[derive(Debug, Default)]
pub struct ErrorContext {
    queue: VecDeque<Diagnostic>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, diagnostic: impl Into<Diagnostic>) {
        let diagnostic = diagnostic.into();
        tracing::debug!(%diagnostic, "queued diagnostic");
        self.queue.push_back(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.queue.iter()
    }

    /// Remove and return every queued diagnostic, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.queue.drain(..)
    }

    /// Move the queue onto the heap as a list of 1-tuples of strings.
    ///
    /// Each diagnostic is consed onto the front in queue order, so the list
    /// reads most recent first. The returned list carries one reference owned
    /// by the caller (none for the empty list).
    pub fn take_errors(&mut self, heap: &mut Heap) -> Result<Value, HeapError> {
        let mut list = Value::EMPTY_LIST;
        while let Some(diagnostic) = self.queue.pop_front() {
            let message = heap.allocate_string(diagnostic.message())?;
            heap.add_ref(message)?;
            let tuple = heap.allocate_tuple([message])?;
            heap.add_ref(tuple)?;
            let tail = list.handle().unwrap_or(Handle::SENTINEL);
            list = heap.allocate_list(tuple, tail)?;
            heap.add_ref(list)?;
        }
        Ok(list)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use garply_ir::Type;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn messages_match_the_runtime_wording() {
        assert_eq!(
            DiagnosticKind::EmptyStackOnExit.to_string(),
            "Invalid expression - evaluation stack was empty upon exit."
        );
        assert_eq!(
            DiagnosticKind::StackImbalance { entry: 0, exit: 2 }.to_string(),
            "Invalid expression - evaluation stack size was modified. \
             Original size: 0, size upon exit: 2."
        );
        assert_eq!(
            DiagnosticKind::ImmutableRebind.to_string(),
            "Cannot rebind to immutable variable."
        );
    }

    #[test]
    fn drain_is_fifo() {
        let mut errors = ErrorContext::new();
        errors.add_error(DiagnosticKind::ImmutableRebind);
        errors.add_error(DiagnosticKind::EmptyStackOnExit);
        let kinds: Vec<_> = errors.drain().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::ImmutableRebind, DiagnosticKind::EmptyStackOnExit]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn take_errors_builds_a_list_most_recent_first() {
        let mut heap = Heap::new();
        let mut errors = ErrorContext::new();
        errors.add_error(DiagnosticKind::ImmutableRebind);
        errors.add_error(DiagnosticKind::EmptyList);

        let list = errors.take_errors(&mut heap).unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            heap.display(list).to_string(),
            "[(\"The empty list has no head or tail.\"),(\"Cannot rebind to immutable variable.\")]"
        );

        heap.remove_ref(list).unwrap();
        assert_eq!(heap.total_live(), 0);
    }

    #[test]
    fn take_errors_on_empty_queue_is_the_empty_list() {
        let mut heap = Heap::new();
        let list = ErrorContext::new().take_errors(&mut heap).unwrap();
        assert_eq!(list, Value::EMPTY_LIST);
        assert_eq!(heap.live_count(Type::List), 0);
    }
}
