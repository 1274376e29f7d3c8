//! Instructions and typed expressions.

use std::fmt;

use crate::{Handle, Opcode, OperandWidth, Type, TypeBits, Value};

/// An opcode with its operand.
///
/// Operand-less opcodes carry `Value::Error`. Factory methods take operands
/// of the exact width the opcode encodes, so anything they build survives an
/// encode/decode round trip unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    operand: Value,
}

impl Instruction {
    /// Pair an opcode with an arbitrary operand (reflective construction).
    #[inline]
    pub const fn from_parts(opcode: Opcode, operand: Value) -> Self {
        Instruction { opcode, operand }
    }

    #[inline]
    const fn bare(opcode: Opcode) -> Self {
        Instruction::from_parts(opcode, Value::Error)
    }

    #[inline]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub const fn operand(&self) -> Value {
        self.operand
    }

    /// Whether the operand is of the kind the opcode loads and fits its
    /// operand width, so the instruction survives an encode/decode round trip.
    pub fn operand_fits(&self) -> bool {
        match (self.opcode.operand_width(), self.opcode, self.operand) {
            (OperandWidth::Zero, _, operand) => operand.is_error(),
            (_, Opcode::LoadBoolean, Value::Boolean(_))
            | (_, Opcode::LoadInteger, Value::Integer(_))
            | (_, Opcode::LoadFloat, Value::Float(_))
            | (_, Opcode::LoadType, Value::Type(_))
            | (_, Opcode::LoadString, Value::String(_))
            | (_, Opcode::LoadOpcode, Value::Opcode(_)) => true,
            (OperandWidth::One, Opcode::TupleItem | Opcode::NewTuple, Value::Integer(n)) => {
                u8::try_from(n).is_ok()
            }
            (
                OperandWidth::Two,
                Opcode::AssignVariable
                | Opcode::AssignMutableVariable
                | Opcode::ReadVariable
                | Opcode::NewExpression,
                Value::Integer(n),
            ) => u16::try_from(n).is_ok(),
            _ => false,
        }
    }

    pub const fn nop() -> Self {
        Instruction::bare(Opcode::Nop)
    }

    pub const fn load_integer(n: i64) -> Self {
        Instruction::from_parts(Opcode::LoadInteger, Value::Integer(n))
    }

    pub fn load_float(x: f64) -> Self {
        Instruction::from_parts(Opcode::LoadFloat, Value::Float(x))
    }

    pub const fn load_boolean(b: bool) -> Self {
        Instruction::from_parts(Opcode::LoadBoolean, Value::Boolean(b))
    }

    pub const fn load_type(ty: Type) -> Self {
        Instruction::load_type_bits(ty.bits())
    }

    /// Load an arbitrary tag pattern, named or not.
    pub const fn load_type_bits(bits: TypeBits) -> Self {
        Instruction::from_parts(Opcode::LoadType, Value::Type(bits))
    }

    pub const fn load_opcode(opcode: Opcode) -> Self {
        Instruction::from_parts(Opcode::LoadOpcode, Value::Opcode(opcode))
    }

    /// Load a literal by its string-database id (not a heap slot).
    pub const fn load_string(id: u32) -> Self {
        Instruction::from_parts(Opcode::LoadString, Value::String(Handle::new(id)))
    }

    pub const fn get_type() -> Self {
        Instruction::bare(Opcode::GetType)
    }

    pub const fn type_is() -> Self {
        Instruction::bare(Opcode::TypeIs)
    }

    pub const fn type_equals() -> Self {
        Instruction::bare(Opcode::TypeEquals)
    }

    pub const fn tuple_arity() -> Self {
        Instruction::bare(Opcode::TupleArity)
    }

    pub fn tuple_item(index: u8) -> Self {
        Instruction::from_parts(Opcode::TupleItem, Value::Integer(i64::from(index)))
    }

    pub fn new_tuple(arity: u8) -> Self {
        Instruction::from_parts(Opcode::NewTuple, Value::Integer(i64::from(arity)))
    }

    /// Build an expression from `count` `(opcode, operand)` tuples plus a type.
    pub fn new_expression(count: u16) -> Self {
        Instruction::from_parts(Opcode::NewExpression, Value::Integer(i64::from(count)))
    }

    pub const fn evaluate_expression() -> Self {
        Instruction::bare(Opcode::EvaluateExpression)
    }

    pub const fn list_empty() -> Self {
        Instruction::bare(Opcode::ListEmpty)
    }

    pub const fn list_add() -> Self {
        Instruction::bare(Opcode::ListAdd)
    }

    pub const fn list_head() -> Self {
        Instruction::bare(Opcode::ListHead)
    }

    pub const fn list_tail() -> Self {
        Instruction::bare(Opcode::ListTail)
    }

    pub fn assign_variable(index: u16, mutable: bool) -> Self {
        let opcode = if mutable {
            Opcode::AssignMutableVariable
        } else {
            Opcode::AssignVariable
        };
        Instruction::from_parts(opcode, Value::Integer(i64::from(index)))
    }

    pub fn read_variable(index: u16) -> Self {
        Instruction::from_parts(Opcode::ReadVariable, Value::Integer(i64::from(index)))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operand.is_error() {
            write!(f, "{}", self.opcode)
        } else {
            write!(f, "{}:{}", self.opcode, self.operand)
        }
    }
}

/// An ordered instruction sequence tagged with its declared result type.
///
/// Data only; the evaluator lives with the heap it needs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expression {
    result_type: TypeBits,
    instructions: Vec<Instruction>,
}

impl Expression {
    pub fn new(result_type: impl Into<TypeBits>, instructions: Vec<Instruction>) -> Self {
        Expression {
            result_type: result_type.into(),
            instructions,
        }
    }

    #[inline]
    pub fn result_type(&self) -> TypeBits {
        self.result_type
    }

    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// One-line form: `expr<Integer>[3]`.
    pub fn short(&self) -> ShortExpression<'_> {
        ShortExpression(self)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr<{}>[", self.result_type)?;
        for (i, instruction) in self.instructions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "\n  {instruction}")?;
        }
        f.write_str("\n]")
    }
}

impl Default for Expression {
    fn default() -> Self {
        Expression::new(TypeBits::empty(), Vec::new())
    }
}

/// See [`Expression::short`].
pub struct ShortExpression<'a>(&'a Expression);

impl fmt::Display for ShortExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr<{}>[{}]", self.0.result_type, self.0.len())
    }
}

/// Incremental construction of an [`Expression`], as a parser emits it.
#[derive(Debug)]
pub struct ExpressionBuilder {
    result_type: TypeBits,
    instructions: Vec<Instruction>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        ExpressionBuilder {
            result_type: TypeBits::empty(),
            instructions: Vec::new(),
        }
    }

    pub fn set_type(&mut self, result_type: impl Into<TypeBits>) -> &mut Self {
        self.result_type = result_type.into();
        self
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) -> &mut Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn build(self) -> Expression {
        Expression {
            result_type: self.result_type,
            instructions: self.instructions,
        }
    }
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
