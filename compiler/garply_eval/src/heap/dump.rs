//! Heap introspection for interactive inspection.
//!
//! Diagnostic only: nothing in evaluation reads a dump.

use std::fmt;

use garply_ir::{Handle, Type, Value};

use super::store::Store;
use super::Heap;

/// One slot of one store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotDump {
    pub count: u32,
    /// Rendered contents; `None` for released slots and empty sentinels.
    pub content: Option<String>,
    /// Whether the index is waiting on the free queue.
    pub free: bool,
}

/// Every slot of one store, in index order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpSection {
    pub kind: Type,
    pub slots: Vec<SlotDump>,
}

/// Snapshot of all four stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapDump {
    pub sections: Vec<DumpSection>,
}

impl HeapDump {
    pub fn section(&self, kind: Type) -> Option<&DumpSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }
}

fn section<T>(store: &Store<T>, render: impl Fn(Handle, &T) -> Option<String>) -> DumpSection {
    DumpSection {
        kind: store.kind(),
        slots: store
            .slots()
            .map(|(handle, count, item, free)| SlotDump {
                count,
                content: item.and_then(|item| render(handle, item)),
                free,
            })
            .collect(),
    }
}

impl Heap {
    /// Snapshot of every store: counts, contents and free indices.
    pub fn dump(&self) -> HeapDump {
        let strings = section(&self.strings, |_, text| Some(text.to_string()));
        let tuples = section(&self.tuples, |handle, items| {
            (!items.is_empty()).then(|| self.display(Value::Tuple(handle)).to_string())
        });
        let lists = section(&self.lists, |handle, _| {
            (!handle.is_sentinel()).then(|| self.display(Value::List(handle)).to_string())
        });
        let expressions = section(&self.expressions, |_, expression| {
            Some(expression.short().to_string())
        });
        HeapDump {
            sections: vec![strings, tuples, lists, expressions],
        }
    }
}

impl fmt::Display for SlotDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = self.content.as_deref().unwrap_or("|Empty|");
        write!(f, "({},{},{})", self.count, content, self.free)
    }
}

/// One line per store: `Strings[(1,abc,false), (0,|Empty|,true)]`.
impl fmt::Display for HeapDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}s[", section.kind)?;
            for (j, slot) in section.slots.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{slot}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
