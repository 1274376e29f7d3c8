//! The stack-machine evaluator.
//!
//! # Reference discipline
//!
//! Every value on the operand stack owns one reference. An instruction that
//! pops a value either moves that reference into whatever it builds (a
//! tuple, a list cell, a scope slot, back onto the stack) or releases it.
//! An instruction that pushes a value it found inside another object
//! (`TupleItem`, `ListHead`, `ListTail`, `ReadVariable`) retains it first.
//!
//! # Frames
//!
//! Each expression owns the stack above the depth it started at. An
//! instruction checks its operands in place before popping any of them, so
//! a rejected instruction leaves every value where the unwind can release
//! it.
//!
//! # Faults
//!
//! Program-level faults queue a diagnostic, release everything this
//! expression pushed and yield `Value::Error`. Collaborator and heap
//! bookkeeping faults return [`EvalFault`].

use garply_ir::{Expression, Handle, Instruction, Opcode, OperandWidth, Type, TypeBits, Value};

use crate::context::ExecutionContext;
use crate::diagnostics::DiagnosticKind;
use crate::errors::EvalFault;
use crate::heap::HeapError;
use crate::scope::{Mutability, ScopeError};
use crate::stack::ensure_sufficient_stack;
use crate::strings::MetadataDatabase;

/// Why an instruction stopped the expression.
enum Halt {
    /// Queue this diagnostic, unwind and yield `Value::Error`.
    Diagnostic(DiagnosticKind),
    /// A diagnostic is already queued; unwind and yield `Value::Error`.
    Queued,
    Fault(EvalFault),
}

impl From<DiagnosticKind> for Halt {
    fn from(kind: DiagnosticKind) -> Self {
        Halt::Diagnostic(kind)
    }
}

impl From<EvalFault> for Halt {
    fn from(fault: EvalFault) -> Self {
        Halt::Fault(fault)
    }
}

impl From<HeapError> for Halt {
    fn from(err: HeapError) -> Self {
        Halt::Fault(err.into())
    }
}

impl From<ScopeError> for Halt {
    fn from(err: ScopeError) -> Self {
        Halt::Fault(err.into())
    }
}

impl<M: MetadataDatabase> ExecutionContext<M> {
    /// Evaluate `expression` against this context.
    ///
    /// Yields the single value the expression leaves on the stack, carrying
    /// one reference the caller owns. An empty expression yields
    /// `Value::Error` without a diagnostic.
    pub fn evaluate(&mut self, expression: &Expression) -> Result<Value, EvalFault> {
        if expression.is_empty() {
            return Ok(Value::Error);
        }
        tracing::trace!(
            len = expression.len(),
            depth = self.meta_depth,
            "evaluating expression"
        );

        let entry = self.stack.len();
        let outer = std::mem::replace(&mut self.frame_base, entry);
        let result = self.run(expression, entry);
        self.frame_base = outer;
        result
    }

    fn run(&mut self, expression: &Expression, entry: usize) -> Result<Value, EvalFault> {
        for instruction in expression.instructions() {
            match self.step(instruction) {
                Ok(()) => {}
                Err(Halt::Diagnostic(kind)) => {
                    self.errors.add_error(kind);
                    self.unwind_to(entry)?;
                    return Ok(Value::Error);
                }
                Err(Halt::Queued) => {
                    self.unwind_to(entry)?;
                    return Ok(Value::Error);
                }
                Err(Halt::Fault(fault)) => return Err(fault),
            }
        }

        if self.stack.len() <= entry {
            self.errors.add_error(DiagnosticKind::EmptyStackOnExit);
            return Ok(Value::Error);
        }
        let result = self.take();
        let exit = self.stack.len();
        if exit != entry {
            self.errors
                .add_error(DiagnosticKind::StackImbalance { entry, exit });
            self.heap.remove_ref(result)?;
            self.unwind_to(entry)?;
            return Ok(Value::Error);
        }
        Ok(result)
    }

    fn step(&mut self, instruction: &Instruction) -> Result<(), Halt> {
        let opcode = instruction.opcode();
        let operand = instruction.operand();
        if !instruction.operand_fits() {
            return Err(DiagnosticKind::InvalidOperand { opcode, operand }.into());
        }
        match opcode {
            Opcode::Nop => {}

            Opcode::LoadInteger
            | Opcode::LoadFloat
            | Opcode::LoadBoolean
            | Opcode::LoadType
            | Opcode::LoadOpcode => self.push(operand),
            Opcode::LoadString => {
                let Value::String(id) = operand else {
                    return Err(DiagnosticKind::InvalidOperand { opcode, operand }.into());
                };
                let text = self
                    .database
                    .load_string(id.raw())
                    .ok_or(EvalFault::UnknownString(id.raw()))?;
                let value = self.heap.allocate_persistent_string(text)?;
                self.heap.add_ref(value)?;
                self.push(value);
            }

            Opcode::GetType => {
                self.require(opcode, 1)?;
                let value = self.take();
                self.push(Value::Type(value.ty().bits()));
                self.heap.remove_ref(value)?;
            }
            Opcode::TypeIs | Opcode::TypeEquals => {
                self.require(opcode, 2)?;
                let rhs = self.peek_type(opcode, 0)?;
                let lhs = self.peek_type(opcode, 1)?;
                self.take();
                self.take();
                let result = if opcode == Opcode::TypeIs {
                    lhs.numeric_is(rhs)
                } else {
                    lhs == rhs
                };
                self.push(Value::Boolean(result));
            }

            Opcode::TupleArity => {
                self.require(opcode, 1)?;
                let handle = self.peek_handle(opcode, 0, Type::Tuple)?;
                let arity = self.heap.tuple(handle)?.len();
                let tuple = self.take();
                self.push(Value::Integer(i64::try_from(arity).unwrap_or(i64::MAX)));
                self.heap.remove_ref(tuple)?;
            }
            Opcode::TupleItem => {
                let index = operand_index(opcode, operand)?;
                self.require(opcode, 1)?;
                let handle = self.peek_handle(opcode, 0, Type::Tuple)?;
                let items = self.heap.tuple(handle)?;
                let item = *items
                    .get(index)
                    .ok_or(DiagnosticKind::TupleIndexOutOfRange {
                        index,
                        arity: items.len(),
                    })?;
                self.heap.add_ref(item)?;
                let tuple = self.take();
                self.push(item);
                self.heap.remove_ref(tuple)?;
            }
            Opcode::NewTuple => {
                let arity = operand_index(opcode, operand)?;
                self.require(opcode, arity)?;
                let tuple = self.allocate_tuple(arity)?;
                self.heap.add_ref(tuple)?;
                self.push(tuple);
            }

            Opcode::NewExpression => {
                let count = operand_index(opcode, operand)?;
                self.require(opcode, count + 1)?;
                let result_type = self.peek_type(opcode, 0)?;
                let mut instructions = Vec::with_capacity(count);
                for index in 0..count {
                    let handle = self.peek_handle(opcode, index + 1, Type::Tuple)?;
                    let instruction = match *self.heap.tuple(handle)? {
                        [Value::Opcode(op), operand] => reflect(op, operand)?,
                        _ => return Err(DiagnosticKind::MalformedInstruction { index }.into()),
                    };
                    instructions.push(instruction);
                }
                self.take();
                for _ in 0..count {
                    let tuple = self.take();
                    self.heap.remove_ref(tuple)?;
                }
                let expression = self.heap.allocate_expression(result_type, instructions)?;
                self.heap.add_ref(expression)?;
                self.push(expression);
            }
            Opcode::EvaluateExpression => {
                self.require(opcode, 1)?;
                let handle = self.peek_handle(opcode, 0, Type::Expression)?;
                if self.meta_depth >= self.options.max_meta_depth {
                    return Err(DiagnosticKind::MetaDepthExceeded {
                        limit: self.options.max_meta_depth,
                    }
                    .into());
                }
                let nested = self.heap.expression(handle)?.clone();
                let value = self.take();
                self.heap.remove_ref(value)?;

                self.meta_depth += 1;
                let result = ensure_sufficient_stack(|| self.evaluate(&nested));
                self.meta_depth -= 1;

                let result = result?;
                if result.is_error() {
                    return Err(DiagnosticKind::NestedEvaluation.into());
                }
                self.push(result);
            }

            Opcode::ListEmpty => self.push(Value::EMPTY_LIST),
            Opcode::ListAdd => {
                self.require(opcode, 2)?;
                let tail = self.peek_handle(opcode, 1, Type::List)?;
                let head = self.take();
                self.take();
                let list = self.heap.allocate_list(head, tail)?;
                self.heap.add_ref(list)?;
                self.push(list);
            }
            Opcode::ListHead | Opcode::ListTail => {
                self.require(opcode, 1)?;
                let handle = self.peek_handle(opcode, 0, Type::List)?;
                if handle.is_sentinel() {
                    return Err(DiagnosticKind::EmptyList.into());
                }
                let cell = self.heap.list(handle)?;
                let value = if opcode == Opcode::ListHead {
                    cell.head
                } else {
                    Value::List(cell.tail)
                };
                self.heap.add_ref(value)?;
                let list = self.take();
                self.push(value);
                self.heap.remove_ref(list)?;
            }

            Opcode::AssignVariable | Opcode::AssignMutableVariable => {
                let index = operand_slot(opcode, operand)?;
                let mutability = if opcode == Opcode::AssignMutableVariable {
                    Mutability::Mutable
                } else {
                    Mutability::Immutable
                };
                self.require(opcode, 1)?;
                let value = self.take();
                let bound =
                    self.scope
                        .set_value(&mut self.heap, &mut self.errors, index, value, mutability)?;
                if bound.is_error() {
                    self.heap.remove_ref(value)?;
                    return Err(Halt::Queued);
                }
                self.push(bound);
            }
            Opcode::ReadVariable => {
                let index = operand_slot(opcode, operand)?;
                let value = self.scope.get_value(index)?;
                if value.is_error() {
                    return Err(DiagnosticKind::UnsetVariable { index }.into());
                }
                self.heap.add_ref(value)?;
                self.push(value);
            }
        }
        Ok(())
    }

    /// Fail unless the running expression has pushed at least `count` values.
    fn require(&self, opcode: Opcode, count: usize) -> Result<(), DiagnosticKind> {
        if self.frame_len() < count {
            Err(DiagnosticKind::StackUnderflow { opcode })
        } else {
            Ok(())
        }
    }

    /// The value `depth` places below the top. Only after [`Self::require`].
    fn peek(&self, depth: usize) -> Value {
        let values = self.stack.as_slice();
        values
            .len()
            .checked_sub(depth + 1)
            .and_then(|i| values.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// Pop a value checked in place; the caller takes over its reference.
    fn take(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }

    fn peek_type(&self, opcode: Opcode, depth: usize) -> Result<TypeBits, DiagnosticKind> {
        let value = self.peek(depth);
        value
            .as_type_bits()
            .ok_or_else(|| mismatch(opcode, Type::Type, value))
    }

    fn peek_handle(
        &self,
        opcode: Opcode,
        depth: usize,
        kind: Type,
    ) -> Result<Handle, DiagnosticKind> {
        let value = self.peek(depth);
        match value.handle() {
            Some(handle) if value.ty() == kind => Ok(handle),
            _ => Err(mismatch(opcode, kind, value)),
        }
    }
}

fn mismatch(opcode: Opcode, expected: Type, found: Value) -> DiagnosticKind {
    DiagnosticKind::TypeMismatch {
        opcode,
        expected,
        found: found.ty(),
    }
}

/// Instruction from a program-built `(opcode, operand)` pair. Operand-less
/// opcodes drop whatever operand they were paired with.
fn reflect(opcode: Opcode, operand: Value) -> Result<Instruction, DiagnosticKind> {
    let operand = if opcode.operand_width() == OperandWidth::Zero {
        Value::Error
    } else {
        operand
    };
    let instruction = Instruction::from_parts(opcode, operand);
    if instruction.operand_fits() {
        Ok(instruction)
    } else {
        Err(DiagnosticKind::InvalidOperand { opcode, operand })
    }
}

/// Non-negative integer operand as a count or tuple index.
fn operand_index(opcode: Opcode, operand: Value) -> Result<usize, DiagnosticKind> {
    operand
        .as_integer()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(DiagnosticKind::InvalidOperand { opcode, operand })
}

/// Integer operand as a variable slot.
fn operand_slot(opcode: Opcode, operand: Value) -> Result<u16, DiagnosticKind> {
    operand
        .as_integer()
        .and_then(|n| u16::try_from(n).ok())
        .ok_or(DiagnosticKind::InvalidOperand { opcode, operand })
}
