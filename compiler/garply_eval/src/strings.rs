//! Literal text referenced by `LoadString` operands.
//!
//! Instruction streams never carry string contents. A `LoadString` operand is
//! an id into a [`MetadataDatabase`] owned by the session; the evaluator
//! resolves it and interns the text on the heap.

use rustc_hash::FxHashMap;

/// Resolves string-literal ids for the evaluator.
pub trait MetadataDatabase {
    /// Id for `text`, registering it if unseen. Equal texts share an id.
    fn register_string(&mut self, text: &str) -> u32;

    /// Text registered under `id`.
    fn load_string(&self, id: u32) -> Option<&str>;
}

/// In-memory literal table with dense ids.
#[derive(Debug, Default)]
pub struct StringDatabase {
    ids: FxHashMap<Box<str>, u32>,
    texts: Vec<Box<str>>,
}

impl StringDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl MetadataDatabase for StringDatabase {
    fn register_string(&mut self, text: &str) -> u32 {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        // Ids are u32 on the wire and saturate.
        let id = u32::try_from(self.texts.len()).unwrap_or(u32::MAX);
        self.texts.push(text.into());
        self.ids.insert(text.into(), id);
        id
    }

    fn load_string(&self, id: u32) -> Option<&str> {
        self.texts.get(id as usize).map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_texts_share_an_id() {
        let mut db = StringDatabase::new();
        let a = db.register_string("hello");
        let b = db.register_string("world");
        let c = db.register_string("hello");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn ids_resolve_back_to_text() {
        let mut db = StringDatabase::new();
        let id = db.register_string("say \"hi\"");
        assert_eq!(db.load_string(id), Some("say \"hi\""));
        assert_eq!(db.load_string(id + 1), None);
    }
}
