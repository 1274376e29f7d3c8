//! The opcode catalogue.
//!
//! Opcode values below 256 encode as a single byte. Larger values encode as
//! two bytes whose first byte is one of the reserved escape values
//! ([`ESCAPE_BYTES`]); those values are never assigned to single-byte
//! opcodes, so a reader always knows after the first byte whether a second
//! one follows.

use std::fmt;
use std::ops::RangeInclusive;

/// First bytes reserved for two-byte opcodes.
pub const ESCAPE_BYTES: RangeInclusive<u8> = 251..=255;

/// Byte width of an opcode's operand. A pure function of the opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperandWidth {
    Zero,
    One,
    Two,
    Four,
    Eight,
}

impl OperandWidth {
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            OperandWidth::Zero => 0,
            OperandWidth::One => 1,
            OperandWidth::Two => 2,
            OperandWidth::Four => 4,
            OperandWidth::Eight => 8,
        }
    }
}

/// Variable-width wire tag of an opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpcodeTag {
    /// One byte, never an escape value.
    Short(u8),
    /// Escape byte followed by a low byte.
    Extended { escape: u8, low: u8 },
}

impl OpcodeTag {
    /// Split a 16-bit opcode value into its wire tag.
    ///
    /// Returns `None` for values that have no encoding: a bare escape byte,
    /// or a two-byte value whose high byte is not an escape.
    pub fn from_code(code: u16) -> Option<Self> {
        let [high, low] = code.to_be_bytes();
        match high {
            0 if !ESCAPE_BYTES.contains(&low) => Some(OpcodeTag::Short(low)),
            0 => None,
            escape if ESCAPE_BYTES.contains(&escape) => Some(OpcodeTag::Extended { escape, low }),
            _ => None,
        }
    }

    /// The 16-bit opcode value.
    pub fn code(self) -> u16 {
        match self {
            OpcodeTag::Short(byte) => u16::from(byte),
            OpcodeTag::Extended { escape, low } => u16::from_be_bytes([escape, low]),
        }
    }

    /// Encoded length in bytes.
    pub const fn encoded_len(self) -> usize {
        match self {
            OpcodeTag::Short(_) => 1,
            OpcodeTag::Extended { .. } => 2,
        }
    }

    /// Whether `byte` starts a two-byte tag.
    #[inline]
    pub fn is_escape(byte: u8) -> bool {
        ESCAPE_BYTES.contains(&byte)
    }
}

/// One operation of the stack machine.
///
/// Discriminants are the wire values and must not be renumbered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Nop = 0,
    GetType = 1,
    TypeIs = 2,
    TypeEquals = 3,
    TupleArity = 4,
    TupleItem = 5,
    ListHead = 6,
    ListTail = 7,
    NewTuple = 8,
    ListEmpty = 9,
    ListAdd = 10,
    LoadBoolean = 11,
    LoadInteger = 12,
    LoadFloat = 13,
    LoadType = 14,
    LoadString = 15,
    AssignVariable = 16,
    ReadVariable = 17,
    AssignMutableVariable = 18,
    LoadOpcode = 19,
    NewExpression = 0xFB01,
    EvaluateExpression = 0xFB02,
}

impl Opcode {
    pub const ALL: [Opcode; 22] = [
        Opcode::Nop,
        Opcode::GetType,
        Opcode::TypeIs,
        Opcode::TypeEquals,
        Opcode::TupleArity,
        Opcode::TupleItem,
        Opcode::ListHead,
        Opcode::ListTail,
        Opcode::NewTuple,
        Opcode::ListEmpty,
        Opcode::ListAdd,
        Opcode::LoadBoolean,
        Opcode::LoadInteger,
        Opcode::LoadFloat,
        Opcode::LoadType,
        Opcode::LoadString,
        Opcode::AssignVariable,
        Opcode::ReadVariable,
        Opcode::AssignMutableVariable,
        Opcode::LoadOpcode,
        Opcode::NewExpression,
        Opcode::EvaluateExpression,
    ];

    /// The 16-bit wire value.
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Look up an opcode by wire value.
    pub fn from_code(code: u16) -> Option<Self> {
        Opcode::ALL.into_iter().find(|opcode| opcode.code() == code)
    }

    /// Wire tag for this opcode.
    pub fn tag(self) -> OpcodeTag {
        let [high, low] = self.code().to_be_bytes();
        if high == 0 {
            OpcodeTag::Short(low)
        } else {
            OpcodeTag::Extended { escape: high, low }
        }
    }

    /// Operand width, fixed before any operand byte is read.
    pub const fn operand_width(self) -> OperandWidth {
        match self {
            Opcode::Nop
            | Opcode::GetType
            | Opcode::TypeIs
            | Opcode::TypeEquals
            | Opcode::TupleArity
            | Opcode::ListHead
            | Opcode::ListTail
            | Opcode::ListEmpty
            | Opcode::ListAdd
            | Opcode::EvaluateExpression => OperandWidth::Zero,
            Opcode::LoadBoolean | Opcode::TupleItem | Opcode::NewTuple => OperandWidth::One,
            Opcode::AssignVariable
            | Opcode::AssignMutableVariable
            | Opcode::ReadVariable
            | Opcode::LoadOpcode
            | Opcode::NewExpression => OperandWidth::Two,
            Opcode::LoadType | Opcode::LoadString => OperandWidth::Four,
            Opcode::LoadInteger | Opcode::LoadFloat => OperandWidth::Eight,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Nop => "Nop",
            Opcode::GetType => "GetType",
            Opcode::TypeIs => "TypeIs",
            Opcode::TypeEquals => "TypeEquals",
            Opcode::TupleArity => "TupleArity",
            Opcode::TupleItem => "TupleItem",
            Opcode::ListHead => "ListHead",
            Opcode::ListTail => "ListTail",
            Opcode::NewTuple => "NewTuple",
            Opcode::ListEmpty => "ListEmpty",
            Opcode::ListAdd => "ListAdd",
            Opcode::LoadBoolean => "LoadBoolean",
            Opcode::LoadInteger => "LoadInteger",
            Opcode::LoadFloat => "LoadFloat",
            Opcode::LoadType => "LoadType",
            Opcode::LoadString => "LoadString",
            Opcode::AssignVariable => "AssignVariable",
            Opcode::ReadVariable => "ReadVariable",
            Opcode::AssignMutableVariable => "AssignMutableVariable",
            Opcode::LoadOpcode => "LoadOpcode",
            Opcode::NewExpression => "NewExpression",
            Opcode::EvaluateExpression => "EvaluateExpression",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests;
