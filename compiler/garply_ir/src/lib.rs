//! Garply IR - the data model of the Garply runtime.
//!
//! This crate contains everything that can exist without a heap:
//! - The type lattice ([`Type`], [`TypeBits`])
//! - Tagged runtime values ([`Value`], [`Handle`])
//! - The opcode catalogue and its variable-width wire tags ([`Opcode`], [`OpcodeTag`])
//! - Instructions and typed expressions ([`Instruction`], [`Expression`])
//! - The linear binary format ([`codec`])
//!
//! # Design
//!
//! - **Handles, not pointers**: heap objects are named by `Handle(u32)` slot
//!   indices; the owning heap lives in `garply_eval`.
//! - **Closed lattice**: subtype checks walk an explicit ancestor table, the
//!   bit patterns exist only for the wire format and the `TypeIs` opcode.

mod instruction;
mod opcode;
mod types;
mod value;

pub mod codec;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use instruction::{Expression, ExpressionBuilder, Instruction, ShortExpression};
pub use opcode::{Opcode, OpcodeTag, OperandWidth, ESCAPE_BYTES};
pub use types::{Type, TypeBits};
pub use value::{Handle, Value};
