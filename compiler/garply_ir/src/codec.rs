//! Linear binary format for instructions and expressions.
//!
//! ```text
//! expression  := u32 result-type-tag, i32 instruction-count, instruction*
//! instruction := opcode-tag (1 or 2 bytes), operand (0/1/2/4/8 bytes)
//! ```
//!
//! All integers are little-endian. The operand width comes from the opcode
//! alone. Operands are written as the low bytes of the value's payload and
//! read back into the kind the opcode implies; `LoadString` operands are
//! string-database ids, resolved by the evaluator.
//!
//! Decoding faults are not recoverable: a stream the decoder cannot identify
//! aborts the whole read.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::{
    Expression, Handle, Instruction, Opcode, OpcodeTag, OperandWidth, TypeBits, Value,
};

/// Malformed or truncated instruction stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of instruction stream")]
    UnexpectedEof,
    #[error("unknown opcode 0x{0:04X}")]
    UnknownOpcode(u16),
    #[error("negative instruction count {0}")]
    NegativeInstructionCount(i32),
    #[error("trailing bytes after expression: {0}")]
    TrailingBytes(usize),
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::UnexpectedEof
        } else {
            DecodeError::Io(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("expression has {0} instructions, more than the format can count")]
    TooManyInstructions(usize),
    /// The operand is not of the opcode's kind or does not fit its width.
    #[error("{opcode} cannot encode operand {operand}")]
    OperandMismatch { opcode: Opcode, operand: Value },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write one instruction.
///
/// Rejects an operand that would not read back unchanged.
pub fn write_instruction<W: Write>(
    w: &mut W,
    instruction: &Instruction,
) -> Result<(), EncodeError> {
    let opcode = instruction.opcode();
    if !instruction.operand_fits() {
        return Err(EncodeError::OperandMismatch {
            opcode,
            operand: instruction.operand(),
        });
    }
    match opcode.tag() {
        OpcodeTag::Short(byte) => w.write_all(&[byte])?,
        OpcodeTag::Extended { escape, low } => w.write_all(&[escape, low])?,
    }
    let width = opcode.operand_width().bytes();
    let payload = instruction.operand().raw_payload().to_le_bytes();
    w.write_all(&payload[..width])?;
    Ok(())
}

/// Read one instruction.
pub fn read_instruction<R: Read>(r: &mut R) -> Result<Instruction, DecodeError> {
    let opcode = read_opcode(r)?;
    let mut payload = [0u8; 8];
    let width = opcode.operand_width();
    r.read_exact(&mut payload[..width.bytes()])?;
    let operand = operand_from_payload(opcode, width, payload)?;
    Ok(Instruction::from_parts(opcode, operand))
}

fn read_opcode<R: Read>(r: &mut R) -> Result<Opcode, DecodeError> {
    let mut first = [0u8; 1];
    r.read_exact(&mut first)?;
    let tag = if OpcodeTag::is_escape(first[0]) {
        let mut low = [0u8; 1];
        r.read_exact(&mut low)?;
        OpcodeTag::Extended {
            escape: first[0],
            low: low[0],
        }
    } else {
        OpcodeTag::Short(first[0])
    };
    let code = tag.code();
    Opcode::from_code(code).ok_or(DecodeError::UnknownOpcode(code))
}

fn operand_from_payload(
    opcode: Opcode,
    width: OperandWidth,
    payload: [u8; 8],
) -> Result<Value, DecodeError> {
    let [b0, b1, b2, b3, ..] = payload;
    let operand = match opcode {
        _ if width == OperandWidth::Zero => Value::Error,
        Opcode::LoadBoolean => Value::Boolean(b0 != 0),
        Opcode::LoadInteger => Value::Integer(i64::from_le_bytes(payload)),
        Opcode::LoadFloat => Value::Float(f64::from_bits(u64::from_le_bytes(payload))),
        Opcode::LoadType => {
            Value::Type(TypeBits::from_bits_retain(u32::from_le_bytes([b0, b1, b2, b3])))
        }
        Opcode::LoadString => Value::String(Handle::new(u32::from_le_bytes([b0, b1, b2, b3]))),
        Opcode::LoadOpcode => {
            let code = u16::from_le_bytes([b0, b1]);
            Value::Opcode(Opcode::from_code(code).ok_or(DecodeError::UnknownOpcode(code))?)
        }
        Opcode::TupleItem | Opcode::NewTuple => Value::Integer(i64::from(b0)),
        _ => Value::Integer(i64::from(u16::from_le_bytes([b0, b1]))),
    };
    Ok(operand)
}

/// Write an expression: type tag, count, instructions.
pub fn write_expression<W: Write>(w: &mut W, expression: &Expression) -> Result<(), EncodeError> {
    let count = i32::try_from(expression.len())
        .map_err(|_| EncodeError::TooManyInstructions(expression.len()))?;
    w.write_all(&expression.result_type().bits().to_le_bytes())?;
    w.write_all(&count.to_le_bytes())?;
    for instruction in expression.instructions() {
        write_instruction(w, instruction)?;
    }
    Ok(())
}

/// Read an expression written by [`write_expression`].
pub fn read_expression<R: Read>(r: &mut R) -> Result<Expression, DecodeError> {
    let mut word = [0u8; 4];
    r.read_exact(&mut word)?;
    let result_type = TypeBits::from_bits_retain(u32::from_le_bytes(word));
    r.read_exact(&mut word)?;
    let count = i32::from_le_bytes(word);
    let count = usize::try_from(count).map_err(|_| DecodeError::NegativeInstructionCount(count))?;

    // Untrusted count: cap the up-front reservation.
    let mut instructions = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        instructions.push(read_instruction(r)?);
    }
    Ok(Expression::new(result_type, instructions))
}

/// Encode an expression into a fresh buffer.
pub fn encode(expression: &Expression) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    write_expression(&mut bytes, expression)?;
    Ok(bytes)
}

/// Decode exactly one expression from `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Expression, DecodeError> {
    let mut reader = bytes;
    let expression = read_expression(&mut reader)?;
    if reader.is_empty() {
        Ok(expression)
    } else {
        Err(DecodeError::TrailingBytes(reader.len()))
    }
}
