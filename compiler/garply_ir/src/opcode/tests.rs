use super::*;

#[test]
fn codes_round_trip() {
    for opcode in Opcode::ALL {
        assert_eq!(Opcode::from_code(opcode.code()), Some(opcode));
    }
    assert_eq!(Opcode::from_code(200), None);
}

#[test]
fn single_byte_opcodes_avoid_escape_values() {
    for opcode in Opcode::ALL {
        match opcode.tag() {
            OpcodeTag::Short(byte) => assert!(!OpcodeTag::is_escape(byte), "{opcode}"),
            OpcodeTag::Extended { escape, .. } => assert!(OpcodeTag::is_escape(escape), "{opcode}"),
        }
    }
}

#[test]
fn meta_operations_use_extended_tags() {
    assert_eq!(
        Opcode::NewExpression.tag(),
        OpcodeTag::Extended { escape: 251, low: 1 }
    );
    assert_eq!(Opcode::EvaluateExpression.tag().encoded_len(), 2);
    assert_eq!(Opcode::ListAdd.tag(), OpcodeTag::Short(10));
    assert_eq!(Opcode::ListAdd.tag().encoded_len(), 1);
}

#[test]
fn tag_from_code_rejects_unencodable_values() {
    assert_eq!(OpcodeTag::from_code(12), Some(OpcodeTag::Short(12)));
    assert_eq!(OpcodeTag::from_code(251), None);
    assert_eq!(OpcodeTag::from_code(0x0101), None);
    assert_eq!(
        OpcodeTag::from_code(0xFF07),
        Some(OpcodeTag::Extended { escape: 255, low: 7 })
    );
    assert_eq!(OpcodeTag::Extended { escape: 253, low: 4 }.code(), 0xFD04);
}

#[test]
fn operand_widths() {
    assert_eq!(Opcode::ListEmpty.operand_width().bytes(), 0);
    assert_eq!(Opcode::TupleItem.operand_width().bytes(), 1);
    assert_eq!(Opcode::ReadVariable.operand_width().bytes(), 2);
    assert_eq!(Opcode::LoadType.operand_width().bytes(), 4);
    assert_eq!(Opcode::LoadInteger.operand_width().bytes(), 8);
}
