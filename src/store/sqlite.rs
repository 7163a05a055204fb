//! SQLite-backed persistent vector store.

use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::metadata::{Metadata, MetadataValue};
use super::schema::apply_schema;
use super::{MalformedVector, decode_vector, encode_vector};

/// Database file inside a store directory.
pub const STORE_FILE: &str = "vectors.sqlite3";

/// A named collection inside the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub name: String,
}

/// A record to insert.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub document: Option<String>,
}

/// A record read back from the store.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    /// Decoded vector, or the reason it could not be decoded.
    pub embedding: std::result::Result<Vec<f32>, MalformedVector>,
    pub metadata: Metadata,
    pub document: Option<String>,
}

/// Persistent vector store rooted at a directory.
#[derive(Debug)]
pub struct VectorStore {
    conn: Connection,
}

impl VectorStore {
    /// Open the store persisted under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if `dir` does not exist, or a database error
    /// if the connection or schema fails.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(Error::StoreNotFound {
                path: dir.to_path_buf(),
            });
        }

        let conn = Connection::open(dir.join(STORE_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing store for reading only.
    ///
    /// Nothing is created: no database file and no schema. Writes through
    /// the returned store fail with a database error.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` if `dir` or its database file does not exist,
    /// or a database error if the file cannot be opened.
    pub fn open_read_only(dir: &Path) -> Result<Self> {
        let file = dir.join(STORE_FILE);
        if !file.is_file() {
            return Err(Error::StoreNotFound {
                path: dir.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(
            &file,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// Create `dir` if needed and open the store in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or opened.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Self::open(dir)
    }

    /// Open an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Collections ───────────────────────────────────────────

    /// Create a new, empty collection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a collection with that name exists.
    pub fn create_collection(&mut self, name: &str) -> Result<Collection> {
        if self.find_collection(name)?.is_some() {
            return Err(Error::InvalidArgument(format!(
                "Collection already exists: {name}"
            )));
        }

        let collection = Collection {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };

        self.conn.execute(
            "INSERT INTO collections (id, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                collection.id,
                collection.name,
                chrono::Utc::now().timestamp_millis()
            ],
        )?;

        Ok(collection)
    }

    /// Resolve a collection by name.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` (with the names that do exist) if there
    /// is no such collection.
    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        match self.find_collection(name)? {
            Some(collection) => Ok(collection),
            None => Err(Error::CollectionNotFound {
                name: name.to_string(),
                available: self.list_collections()?,
            }),
        }
    }

    fn find_collection(&self, name: &str) -> Result<Option<Collection>> {
        self.conn
            .query_row(
                "SELECT id, name FROM collections WHERE name = ?1",
                [name],
                |row| {
                    Ok(Collection {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Error::from)
    }

    /// Names of all collections, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // ── Records ───────────────────────────────────────────────

    /// Number of records in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, collection: &Collection) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection_id = ?1",
            [&collection.id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Insert records in one transaction. Returns the number inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails (e.g. a duplicate id); nothing
    /// is written in that case.
    pub fn add(&mut self, collection: &Collection, records: &[NewRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let now = chrono::Utc::now().timestamp_millis();

        for record in records {
            tx.execute(
                "INSERT INTO embeddings (collection_id, embedding_id, vector, document, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    collection.id,
                    record.id,
                    encode_vector(&record.embedding),
                    record.document,
                    now
                ],
            )?;
            let seq = tx.last_insert_rowid();

            for (key, value) in record.metadata.iter() {
                let (s, i, f, b): (Option<&str>, Option<i64>, Option<f64>, Option<bool>) =
                    match value {
                        MetadataValue::Str(s) => (Some(s), None, None, None),
                        MetadataValue::Int(i) => (None, Some(*i), None, None),
                        MetadataValue::Float(f) => (None, None, Some(*f), None),
                        MetadataValue::Bool(b) => (None, None, None, Some(*b)),
                    };
                tx.execute(
                    "INSERT INTO embedding_metadata (seq, key, string_value, int_value, float_value, bool_value)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![seq, key, s, i, f, b],
                )?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    /// Read every record of a collection in insertion order.
    ///
    /// Vectors, metadata and documents come back in one pass. A vector BLOB
    /// that cannot be decoded is reported on its record, not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_all(&self, collection: &Collection) -> Result<Vec<StoredRecord>> {
        let mut metadata = self.load_metadata(collection)?;

        let mut stmt = self.conn.prepare(
            "SELECT seq, embedding_id, vector, document
             FROM embeddings
             WHERE collection_id = ?1
             ORDER BY seq",
        )?;

        let rows = stmt.query_map([&collection.id], |row| {
            let seq: i64 = row.get(0)?;
            let id: String = row.get(1)?;
            let blob: Vec<u8> = row.get(2)?;
            let document: Option<String> = row.get(3)?;
            Ok((seq, id, blob, document))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (seq, id, blob, document) = row?;
            records.push(StoredRecord {
                id,
                embedding: decode_vector(&blob),
                metadata: metadata.remove(&seq).unwrap_or_default(),
                document,
            });
        }

        Ok(records)
    }

    fn load_metadata(&self, collection: &Collection) -> Result<HashMap<i64, Metadata>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.seq, m.key, m.string_value, m.int_value, m.float_value, m.bool_value
             FROM embedding_metadata m
             JOIN embeddings e ON e.seq = m.seq
             WHERE e.collection_id = ?1",
        )?;

        let rows = stmt.query_map([&collection.id], |row| {
            let seq: i64 = row.get(0)?;
            let key: String = row.get(1)?;
            let value = if let Some(s) = row.get::<_, Option<String>>(2)? {
                Some(MetadataValue::Str(s))
            } else if let Some(i) = row.get::<_, Option<i64>>(3)? {
                Some(MetadataValue::Int(i))
            } else if let Some(f) = row.get::<_, Option<f64>>(4)? {
                Some(MetadataValue::Float(f))
            } else {
                row.get::<_, Option<bool>>(5)?.map(MetadataValue::Bool)
            };
            Ok((seq, key, value))
        })?;

        let mut by_seq: HashMap<i64, Metadata> = HashMap::new();
        for row in rows {
            let (seq, key, value) = row?;
            if let Some(value) = value {
                by_seq.entry(seq).or_default().insert(&key, value);
            }
        }

        Ok(by_seq)
    }
}
