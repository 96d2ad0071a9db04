// src/table.rs

use anyhow::Result;
use std::{borrow::Borrow, collections::HashMap, fmt, hash::Hash, io::Write, sync::Arc};

use crate::load::RowReader;
use crate::write::RowWriter;

/// One decoded row of a table.
pub trait Entity {
    /// Identifying key: the plain id, or a [`CompoundKey`] for tables with no single identifying column.
    type Key: Eq + Hash + fmt::Display;

    /// 1-based data row the entity was read from, excluding the header.
    fn source_row(&self) -> u64;

    /// `None` when the key field(s) were missing from the row.
    fn key(&self) -> Option<Self::Key>;

    /// The simple string id. Entities keyed by an id plus a sequence have no such
    /// thing, and asking for it is a bug in the caller.
    fn id(&self) -> Option<&str> {
        panic!(
            "{} has a compound key; use key() instead of id()",
            std::any::type_name::<Self>()
        )
    }

    /// Second element of a compound key, for the entities that have one.
    fn sequence_number(&self) -> Option<i32> {
        None
    }
}

/// Key made of an id and a second distinguishing part (a sequence number, a date...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompoundKey<T = i32> {
    pub id: Arc<str>,
    pub part: T,
}

impl<T> CompoundKey<T> {
    pub fn new(id: Arc<str>, part: T) -> Self {
        Self { id, part }
    }
}

impl<T: fmt::Display> fmt::Display for CompoundKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.part)
    }
}

/// Named collection of entities keyed by their identifying key.
#[derive(Debug)]
pub struct Table<E: Entity> {
    name: &'static str,
    rows: HashMap<E::Key, E>,
}

impl<E: Entity> Table<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&E>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.rows.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.rows.contains_key(key)
    }

    /// Inserts under `key`, returning whatever was stored there before.
    pub fn insert(&mut self, key: E::Key, entity: E) -> Option<E> {
        self.rows.insert(key, entity)
    }

    /// Entities in arbitrary order.
    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&E::Key, &E)> {
        self.rows.iter()
    }

    /// Entities ordered by the row they were read from, for stable output.
    pub fn by_source_row(&self) -> Vec<&E> {
        let mut sorted: Vec<&E> = self.rows.values().collect();
        sorted.sort_by_key(|e| e.source_row());
        sorted
    }
}

/// Describes one table: its file name, columns, key, and how a row maps to and
/// from an entity. Descriptor values hold references to the tables their
/// foreign keys point into.
pub trait TableSpec {
    type Entity: Entity;

    /// Table name; the archive entry is `<NAME>.txt`.
    const NAME: &'static str;
    const REQUIRED: bool;
    /// Column(s) the key is taken from, for `MissingKey`/`DuplicateKey` reporting.
    const KEY_FIELD: &'static str;
    /// Header written on output, in order.
    const COLUMNS: &'static [&'static str];

    fn decode(&self, row: &mut RowReader<'_>) -> Self::Entity;

    fn encode<W: Write>(&self, entity: &Self::Entity, row: &mut RowWriter<'_, W>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        id: Option<Arc<str>>,
        row: u64,
    }

    impl Entity for Plain {
        type Key = Arc<str>;
        fn source_row(&self) -> u64 {
            self.row
        }
        fn key(&self) -> Option<Arc<str>> {
            self.id.clone()
        }
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    struct Sequenced {
        id: Arc<str>,
        seq: i32,
    }

    impl Entity for Sequenced {
        type Key = CompoundKey;
        fn source_row(&self) -> u64 {
            1
        }
        fn key(&self) -> Option<CompoundKey> {
            Some(CompoundKey::new(Arc::clone(&self.id), self.seq))
        }
        fn sequence_number(&self) -> Option<i32> {
            Some(self.seq)
        }
    }

    #[test]
    fn lookup_by_borrowed_str() {
        let mut table = Table::new("things");
        for (row, id) in [(2, "b"), (1, "a"), (3, "c")] {
            let e = Plain {
                id: Some(Arc::from(id)),
                row,
            };
            table.insert(e.key().unwrap(), e);
        }
        assert_eq!(table.get("a").and_then(Plain::id), Some("a"));
        assert!(!table.contains_key("z"));
        let order: Vec<u64> = table.by_source_row().iter().map(|e| e.row).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn compound_key_displays_both_parts() {
        let e = Sequenced {
            id: Arc::from("shape-1"),
            seq: 7,
        };
        assert_eq!(e.key().unwrap().to_string(), "shape-1:7");
        assert_eq!(e.sequence_number(), Some(7));
    }

    #[test]
    #[should_panic(expected = "compound key")]
    fn simple_id_on_compound_entity_panics() {
        let e = Sequenced {
            id: Arc::from("t"),
            seq: 1,
        };
        let _ = e.id();
    }
}
