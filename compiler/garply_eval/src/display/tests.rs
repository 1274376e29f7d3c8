#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use garply_ir::{Instruction, Opcode, Type, TypeBits};
use pretty_assertions::assert_eq;

use crate::heap::Heap;

use super::*;

#[test]
fn inline_values_render_without_the_heap() {
    let heap = Heap::new();
    let cases = [
        (Value::Error, "#Error#"),
        (Value::Boolean(true), "true"),
        (Value::Integer(-7), "-7"),
        (Value::Float(2.5), "2.5"),
        (Value::of_type(Type::Integer), "<Integer>"),
        (Value::Opcode(Opcode::ListAdd), "|ListAdd|"),
    ];
    for (value, expected) in cases {
        assert_eq!(heap.display(value).to_string(), expected);
    }
}

#[test]
fn strings_are_quoted_with_doubled_quotes() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("say \"hi\"").unwrap();
    assert_eq!(heap.display(text).to_string(), "\"say \"\"hi\"\"\"");
}

#[test]
fn nested_tuples_and_lists() {
    let mut heap = Heap::new();
    let inner = heap
        .allocate_list_from([Value::Integer(1), Value::Integer(2)])
        .unwrap();
    heap.add_ref(inner).unwrap();
    let tuple = heap
        .allocate_tuple([inner, Value::Boolean(false)])
        .unwrap();
    assert_eq!(heap.display(tuple).to_string(), "([1,2],false)");
    assert_eq!(heap.display(Value::EMPTY_LIST).to_string(), "[]");
    assert_eq!(heap.display(Value::EMPTY_TUPLE).to_string(), "()");
}

#[test]
fn expressions_render_in_full() {
    let mut heap = Heap::new();
    let expression = heap
        .allocate_expression(
            TypeBits::from(Type::Integer),
            vec![Instruction::load_integer(3), Instruction::get_type()],
        )
        .unwrap();
    assert_eq!(
        heap.display(expression).to_string(),
        "expr<Integer>[\n  LoadInteger:3,\n  GetType\n]"
    );
}

#[test]
fn released_handles_fall_back_to_slot_form() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("gone").unwrap();
    heap.add_ref(text).unwrap();
    heap.remove_ref(text).unwrap();
    assert_eq!(heap.display(text).to_string(), "String#0");
}
