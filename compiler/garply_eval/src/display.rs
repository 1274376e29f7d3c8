//! Content-aware value rendering.
//!
//! `Value`'s own `Display` cannot see the heap, so handles render as
//! `List#3`. [`Heap::display`] resolves them:
//!
//! | Kind | Form |
//! |---|---|
//! | String | `"text"`, inner quotes doubled |
//! | Tuple | `(a,b)` |
//! | List | `[a,b]` |
//! | Expression | full multi-line `expr<T>[...]` |
//!
//! A handle that no longer resolves falls back to the heap-free form.

use std::fmt;

use garply_ir::Value;

use crate::heap::Heap;

/// See [`Heap::display`].
pub struct DisplayValue<'a> {
    heap: &'a Heap,
    value: Value,
}

impl Heap {
    /// Render `value` with its heap contents.
    pub fn display(&self, value: Value) -> DisplayValue<'_> {
        DisplayValue { heap: self, value }
    }
}

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heap = self.heap;
        match self.value {
            Value::String(h) => match heap.string(h) {
                Ok(text) => write!(f, "\"{}\"", text.replace('"', "\"\"")),
                Err(_) => write!(f, "{}", self.value),
            },
            Value::Tuple(h) => match heap.tuple(h) {
                Ok(items) => {
                    f.write_str("(")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{}", heap.display(*item))?;
                    }
                    f.write_str(")")
                }
                Err(_) => write!(f, "{}", self.value),
            },
            Value::List(h) => {
                f.write_str("[")?;
                let mut cursor = h;
                let mut first = true;
                while !cursor.is_sentinel() {
                    let Ok(cell) = heap.list(cursor) else {
                        write!(f, "{}", Value::List(cursor))?;
                        break;
                    };
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    write!(f, "{}", heap.display(cell.head))?;
                    cursor = cell.tail;
                }
                f.write_str("]")
            }
            Value::Expression(h) => match heap.expression(h) {
                Ok(expression) => write!(f, "{expression}"),
                Err(_) => write!(f, "{}", self.value),
            },
            inline => write!(f, "{inline}"),
        }
    }
}

#[cfg(test)]
mod tests;
