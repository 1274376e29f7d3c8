use pretty_assertions::assert_eq;

use super::*;

#[test]
fn fresh_allocation_has_zero_count() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("abc").unwrap();
    assert_eq!(heap.ref_count(text), Some(0));
    heap.add_ref(text).unwrap();
    assert_eq!(heap.ref_count(text), Some(1));
}

#[test]
fn release_at_zero_frees_exactly_once() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("abc").unwrap();
    heap.add_ref(text).unwrap();
    heap.add_ref(text).unwrap();

    heap.remove_ref(text).unwrap();
    assert_eq!(heap.string(text.handle().unwrap()).unwrap(), "abc");

    heap.remove_ref(text).unwrap();
    assert_eq!(heap.ref_count(text), None);
    assert_eq!(
        heap.remove_ref(text),
        Err(HeapError::DanglingHandle {
            kind: Type::String,
            index: 0
        })
    );
}

#[test]
fn releasing_unretained_slot_underflows() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("abc").unwrap();
    assert_eq!(
        heap.remove_ref(text),
        Err(HeapError::RefcountUnderflow {
            kind: Type::String,
            index: 0
        })
    );
}

#[test]
fn freed_slots_are_reused_in_order() {
    let mut heap = Heap::new();
    let a = heap.allocate_string("a").unwrap();
    let b = heap.allocate_string("b").unwrap();
    heap.add_ref(a).unwrap();
    heap.add_ref(b).unwrap();
    heap.remove_ref(a).unwrap();
    heap.remove_ref(b).unwrap();

    let c = heap.allocate_string("c").unwrap();
    let d = heap.allocate_string("d").unwrap();
    assert_eq!(c, a);
    assert_eq!(d, b);
    assert_eq!(heap.string(c.handle().unwrap()).unwrap(), "c");
}

#[test]
fn plain_strings_are_never_shared() {
    let mut heap = Heap::new();
    let a = heap.allocate_string("same").unwrap();
    let b = heap.allocate_string("same").unwrap();
    assert_ne!(a, b);
}

#[test]
fn persistent_strings_are_interned_until_released() {
    let mut heap = Heap::new();
    let a = heap.allocate_persistent_string("same").unwrap();
    let b = heap.allocate_persistent_string("same").unwrap();
    assert_eq!(a, b);

    heap.add_ref(a).unwrap();
    heap.remove_ref(a).unwrap();
    assert_eq!(heap.live_count(Type::String), 0);

    // The slot is reused by an unrelated string; the stale intern entry
    // must not resolve to it.
    let other = heap.allocate_string("other").unwrap();
    assert_eq!(other, a);
    let fresh = heap.allocate_persistent_string("same").unwrap();
    assert_ne!(fresh, other);
    assert_eq!(heap.string(fresh.handle().unwrap()).unwrap(), "same");
}

#[test]
fn content_hash_is_stable() {
    assert_eq!(content_hash(""), 0x542c_2caa_6d87_70ef);
    let expected = 0x542c_2caa_6d87_70ef_u64.wrapping_mul(1_251_953) ^ u64::from(b'a');
    assert_eq!(content_hash("a"), expected);
}

#[test]
fn tuple_release_cascades_to_items() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("item").unwrap();
    heap.add_ref(text).unwrap();
    let tuple = heap.allocate_tuple([text, Value::Integer(1)]).unwrap();
    heap.add_ref(tuple).unwrap();

    heap.remove_ref(tuple).unwrap();
    assert_eq!(heap.total_live(), 0);
}

#[test]
fn shared_item_survives_tuple_release() {
    let mut heap = Heap::new();
    let text = heap.allocate_string("shared").unwrap();
    heap.add_ref(text).unwrap();
    heap.add_ref(text).unwrap();
    let tuple = heap.allocate_tuple([text]).unwrap();
    heap.add_ref(tuple).unwrap();

    heap.remove_ref(tuple).unwrap();
    assert_eq!(heap.ref_count(text), Some(1));
}

#[test]
fn list_cells_link_to_tail() {
    let mut heap = Heap::new();
    let list = heap
        .allocate_list_from([Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        .unwrap();
    let mut heads = Vec::new();
    let mut cursor = list.handle().unwrap();
    while !cursor.is_sentinel() {
        let cell = heap.list(cursor).unwrap();
        heads.push(cell.head);
        cursor = cell.tail;
    }
    assert_eq!(
        heads,
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );
    assert_eq!(heap.ref_count(list), Some(0));
}

#[test]
fn long_list_release_does_not_recurse() {
    let mut heap = Heap::new();
    let list = heap
        .allocate_list_from((0..100_000).map(Value::Integer).collect::<Vec<_>>())
        .unwrap();
    heap.add_ref(list).unwrap();
    assert_eq!(heap.live_count(Type::List), 100_000);

    heap.remove_ref(list).unwrap();
    assert_eq!(heap.live_count(Type::List), 0);
}

#[test]
fn shared_tail_survives_head_release() {
    let mut heap = Heap::new();
    let tail = heap.allocate_list_from([Value::Integer(2)]).unwrap();
    heap.add_ref(tail).unwrap();
    heap.add_ref(tail).unwrap();
    let list = heap
        .allocate_list(Value::Integer(1), tail.handle().unwrap())
        .unwrap();
    heap.add_ref(list).unwrap();

    heap.remove_ref(list).unwrap();
    assert_eq!(heap.ref_count(tail), Some(1));
    assert_eq!(heap.live_count(Type::List), 1);
}

#[test]
fn sentinels_are_pinned() {
    let mut heap = Heap::new();
    for _ in 0..3 {
        heap.remove_ref(Value::EMPTY_LIST).unwrap();
        heap.remove_ref(Value::EMPTY_TUPLE).unwrap();
    }
    assert!(heap.tuple(Handle::SENTINEL).unwrap().is_empty());
    assert_eq!(heap.list(Handle::SENTINEL).unwrap().tail, Handle::SENTINEL);
    assert_eq!(heap.total_live(), 0);

    let list = heap.allocate_list(Value::Integer(1), Handle::SENTINEL).unwrap();
    assert_ne!(list, Value::EMPTY_LIST);
}

#[test]
fn list_tail_must_be_live() {
    let mut heap = Heap::new();
    assert_eq!(
        heap.allocate_list(Value::Integer(1), Handle::new(9)),
        Err(HeapError::DanglingHandle {
            kind: Type::List,
            index: 9
        })
    );
}

#[test]
fn inline_values_ignore_counting() {
    let mut heap = Heap::new();
    heap.add_ref(Value::Integer(1)).unwrap();
    heap.remove_ref(Value::Boolean(true)).unwrap();
    assert_eq!(heap.ref_count(Value::Float(1.0)), None);
}

#[test]
fn dump_shows_counts_contents_and_free_slots() {
    let mut heap = Heap::new();
    let a = heap.allocate_string("a").unwrap();
    let b = heap.allocate_string("b").unwrap();
    heap.add_ref(a).unwrap();
    heap.add_ref(b).unwrap();
    heap.remove_ref(a).unwrap();
    let tuple = heap.allocate_tuple([b, Value::Integer(2)]).unwrap();
    heap.add_ref(tuple).unwrap();

    let dump = heap.dump();
    let strings = dump.section(Type::String).unwrap();
    assert_eq!(
        strings.slots,
        vec![
            SlotDump {
                count: 0,
                content: None,
                free: true
            },
            SlotDump {
                count: 1,
                content: Some("b".to_string()),
                free: false
            },
        ]
    );
    assert_eq!(
        dump.to_string(),
        format!(
            "Strings[(0,|Empty|,true), (1,b,false)]\n\
             Tuples[({},|Empty|,false), (1,(\"b\",2),false)]\n\
             Lists[({},|Empty|,false)]\n\
             Expressions[]",
            u32::MAX / 2,
            u32::MAX / 2
        )
    );
}
