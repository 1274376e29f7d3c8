use super::*;

#[test]
fn assign_variable_picks_opcode_by_mutability() {
    assert_eq!(
        Instruction::assign_variable(3, false).opcode(),
        Opcode::AssignVariable
    );
    assert_eq!(
        Instruction::assign_variable(3, true).opcode(),
        Opcode::AssignMutableVariable
    );
    assert_eq!(
        Instruction::assign_variable(3, true).operand(),
        Value::Integer(3)
    );
}

#[test]
fn bare_instructions_carry_error_operand() {
    assert!(Instruction::list_add().operand().is_error());
    assert_eq!(Instruction::list_add().to_string(), "ListAdd");
    assert_eq!(Instruction::load_integer(9).to_string(), "LoadInteger:9");
    assert_eq!(
        Instruction::load_type(Type::Float).to_string(),
        "LoadType:<Float>"
    );
}

#[test]
fn expression_display_forms() {
    let mut builder = ExpressionBuilder::new();
    builder
        .set_type(Type::Integer)
        .push(Instruction::load_integer(1))
        .push(Instruction::nop());
    let expression = builder.build();

    assert_eq!(expression.short().to_string(), "expr<Integer>[2]");
    assert_eq!(
        expression.to_string(),
        "expr<Integer>[\n  LoadInteger:1,\n  Nop\n]"
    );
}

#[test]
fn empty_expression() {
    let expression = Expression::default();
    assert!(expression.is_empty());
    assert_eq!(expression.result_type(), TypeBits::empty());
    assert_eq!(expression.short().to_string(), "expr<Error>[0]");
}

#[test]
fn factory_operands_fit_their_opcode() {
    let instructions = [
        Instruction::nop(),
        Instruction::load_integer(i64::MIN),
        Instruction::load_float(f64::NAN),
        Instruction::load_boolean(false),
        Instruction::load_type(Type::Number),
        Instruction::load_opcode(Opcode::EvaluateExpression),
        Instruction::load_string(u32::MAX),
        Instruction::tuple_item(u8::MAX),
        Instruction::new_tuple(0),
        Instruction::new_expression(u16::MAX),
        Instruction::assign_variable(u16::MAX, true),
        Instruction::read_variable(0),
        Instruction::evaluate_expression(),
    ];
    for instruction in instructions {
        assert!(instruction.operand_fits(), "{instruction}");
    }
}

#[test]
fn reflective_operands_are_checked_by_kind_and_range() {
    let fits =
        |opcode: Opcode, operand: Value| Instruction::from_parts(opcode, operand).operand_fits();
    assert!(fits(Opcode::TupleItem, Value::Integer(255)));
    assert!(!fits(Opcode::TupleItem, Value::Integer(256)));
    assert!(fits(Opcode::AssignVariable, Value::Integer(65_535)));
    assert!(!fits(Opcode::AssignVariable, Value::Integer(65_536)));
    assert!(!fits(Opcode::NewExpression, Value::Integer(-1)));
    assert!(!fits(Opcode::LoadInteger, Value::Boolean(true)));
    assert!(!fits(Opcode::LoadBoolean, Value::Integer(1)));
    assert!(!fits(Opcode::TupleItem, Value::Float(1.0)));
    assert!(!fits(Opcode::GetType, Value::Integer(0)));
    assert!(fits(Opcode::GetType, Value::Error));
}
