use super::*;

#[test]
fn default_is_error_sentinel() {
    let v = Value::default();
    assert!(v.is_error());
    assert_eq!(v.ty(), Type::Error);
    assert_eq!(v.raw_payload(), 0);
}

#[test]
fn equality_is_tag_plus_payload() {
    assert_eq!(Value::Integer(1), Value::Integer(1));
    assert_ne!(Value::Integer(1), Value::Boolean(true));
    assert_ne!(Value::Integer(0), Value::Error);
    assert_eq!(Value::String(Handle::new(3)), Value::String(Handle::new(3)));
    assert_ne!(Value::String(Handle::new(3)), Value::Tuple(Handle::new(3)));
}

#[test]
fn floats_compare_by_bits() {
    let nan = Value::Float(f64::NAN);
    assert_eq!(nan, nan);
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
}

#[test]
fn handles_report_static_kind() {
    assert_eq!(Value::EMPTY_LIST.ty(), Type::List);
    assert_eq!(Value::Expression(Handle::new(7)).ty(), Type::Expression);
    assert_eq!(Value::EMPTY_TUPLE.handle(), Some(Handle::SENTINEL));
    assert_eq!(Value::Integer(4).handle(), None);
}

#[test]
fn negative_integers_keep_their_bits() {
    assert_eq!(Value::Integer(-1).raw_payload(), u64::MAX);
}

#[test]
fn display_inline_values() {
    assert_eq!(Value::Error.to_string(), "#Error#");
    assert_eq!(Value::Boolean(false).to_string(), "false");
    assert_eq!(Value::Integer(-12).to_string(), "-12");
    assert_eq!(Value::Float(1.5).to_string(), "1.5");
    assert_eq!(Value::of_type(Type::Integer).to_string(), "<Integer>");
    assert_eq!(Value::Opcode(Opcode::ListAdd).to_string(), "|ListAdd|");
    assert_eq!(Value::List(Handle::new(2)).to_string(), "List#2");
}
