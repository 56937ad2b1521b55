//! Bundled SQLite-backed collaborator
//!
//! Stands in for the external columnar analytical store (Collaborator A)
//! and the external KV store (Collaborator B) so `kato-core` runs
//! standalone. A production deployment is expected to supply its own
//! [`ColumnarStore`]/[`KvStore`] implementations against its real
//! warehouse/KV cluster; this one is a faithful, fully-functional default,
//! not a stub.
//!
//! A single connection behind a `Mutex` for interior mutability, WAL
//! journal mode, and `Send + Sync` so callers can share one instance
//! behind an `Arc` rather than an `Arc<Mutex<_>>` at the call site.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::pattern::PatternCore;

use super::error::{Result, StorageError};
use super::migrations::MIGRATIONS;
use super::traits::{AnnPayload, AnnService, ColumnarStore, KvStore, PrefilterRow};

/// Bundled SQLite collaborator implementing both [`ColumnarStore`] and
/// [`KvStore`] (and, via [`SqliteAnnService`], a minimal [`AnnService`]).
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (creating if needed) a SQLite-backed collaborator at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let backend = Self { conn: Mutex::new(conn) };
        backend.migrate()?;
        Ok(backend)
    }

    /// In-memory instance, primarily for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        let backend = Self { conn: Mutex::new(conn) };
        backend.migrate()?;
        Ok(backend)
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("connection mutex poisoned");
        for migration in MIGRATIONS {
            conn.execute_batch(migration.up)?;
        }
        Ok(())
    }

    fn write_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("connection mutex poisoned")
    }

    fn read_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("connection mutex poisoned")
    }
}

fn row_to_core(
    name: String,
    length: u32,
    token_count: u32,
    first_token: String,
    last_token: String,
    event_data: String,
    minhash: String,
    lsh_bands: String,
    created_at: String,
    updated_at: String,
) -> Result<PatternCore> {
    Ok(PatternCore {
        name,
        events: serde_json::from_str(&event_data)?,
        length,
        token_count,
        first_token,
        last_token,
        minhash: serde_json::from_str(&minhash)?,
        lsh_bands: serde_json::from_str(&lsh_bands)?,
        created_at: Some(parse_rfc3339(&created_at)?),
        updated_at: Some(parse_rfc3339(&updated_at)?),
    })
}

fn parse_rfc3339(value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    Ok(chrono::DateTime::parse_from_rfc3339(value)
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp {value:?}: {e}")))?
        .with_timezone(&chrono::Utc))
}

impl ColumnarStore for SqliteBackend {
    fn insert_if_absent(&self, kb_id: &str, core: &PatternCore) -> Result<bool> {
        let conn = self.write_conn();
        let now = chrono::Utc::now().to_rfc3339();
        let event_data = serde_json::to_string(&core.events)?;
        let minhash = serde_json::to_string(&core.minhash)?;
        let lsh_bands = serde_json::to_string(&core.lsh_bands)?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO patterns
                (kb_id, name, length, token_count, first_token, last_token,
                 event_data, minhash, lsh_bands, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                kb_id,
                core.name,
                core.length,
                core.token_count,
                core.first_token,
                core.last_token,
                event_data,
                minhash,
                lsh_bands,
                now,
            ],
        )?;

        if inserted > 0 {
            for (band_index, band_hash) in core.lsh_bands.iter().enumerate() {
                conn.execute(
                    "INSERT OR IGNORE INTO lsh_postings (kb_id, band_index, band_hash, pattern_name)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![kb_id, band_index as i64, *band_hash as i64, core.name],
                )?;
            }
        } else {
            // Body is immutable (I2), but `updated_at` tracks re-learns.
            conn.execute(
                "UPDATE patterns SET updated_at = ?1 WHERE kb_id = ?2 AND name = ?3",
                params![now, kb_id, core.name],
            )?;
        }
        Ok(inserted > 0)
    }

    fn fetch(&self, kb_id: &str, names: &[String]) -> Result<Vec<PatternCore>> {
        names
            .iter()
            .filter_map(|name| self.fetch_one(kb_id, name).transpose())
            .collect()
    }

    fn fetch_one(&self, kb_id: &str, name: &str) -> Result<Option<PatternCore>> {
        let conn = self.read_conn();
        conn.query_row(
            "SELECT name, length, token_count, first_token, last_token, event_data, minhash, lsh_bands,
                    created_at, updated_at
             FROM patterns WHERE kb_id = ?1 AND name = ?2",
            params![kb_id, name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                ))
            },
        )
        .optional()?
        .map(
            |(name, length, token_count, first_token, last_token, event_data, minhash, lsh_bands, created_at, updated_at)| {
                row_to_core(
                    name, length, token_count, first_token, last_token, event_data, minhash, lsh_bands,
                    created_at, updated_at,
                )
            },
        )
        .transpose()
    }

    fn fetch_prefilter(&self, kb_id: &str, name: &str) -> Result<Option<PrefilterRow>> {
        let conn = self.read_conn();
        conn.query_row(
            "SELECT length, token_count, first_token, last_token FROM patterns
             WHERE kb_id = ?1 AND name = ?2",
            params![kb_id, name],
            |row| {
                Ok(PrefilterRow {
                    length: row.get(0)?,
                    token_count: row.get(1)?,
                    first_token: row.get(2)?,
                    last_token: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn upsert_lsh_postings(&self, kb_id: &str, name: &str, bands: &[u64]) -> Result<()> {
        let conn = self.write_conn();
        for (band_index, band_hash) in bands.iter().enumerate() {
            conn.execute(
                "INSERT OR IGNORE INTO lsh_postings (kb_id, band_index, band_hash, pattern_name)
                 VALUES (?1, ?2, ?3, ?4)",
                params![kb_id, band_index as i64, *band_hash as i64, name],
            )?;
        }
        Ok(())
    }

    fn candidates_by_bands(&self, kb_id: &str, band_hashes: &[u64]) -> Result<HashSet<String>> {
        let conn = self.read_conn();
        let mut names = HashSet::new();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT pattern_name FROM lsh_postings WHERE kb_id = ?1 AND band_hash = ?2",
        )?;
        for band_hash in band_hashes {
            let rows = stmt.query_map(params![kb_id, *band_hash as i64], |row| row.get::<_, String>(0))?;
            for row in rows {
                names.insert(row?);
            }
        }
        Ok(names)
    }

    fn shared_band_count(&self, kb_id: &str, name: &str, query_bands: &[u64]) -> Result<usize> {
        let conn = self.read_conn();
        let mut stmt = conn.prepare(
            "SELECT band_hash FROM lsh_postings WHERE kb_id = ?1 AND pattern_name = ?2",
        )?;
        let stored: HashSet<i64> = stmt
            .query_map(params![kb_id, name], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(query_bands.iter().filter(|h| stored.contains(&(**h as i64))).count())
    }

    fn count(&self, kb_id: &str) -> Result<u64> {
        let conn = self.read_conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM patterns WHERE kb_id = ?1",
            params![kb_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn drop_partition(&self, kb_id: &str) -> Result<()> {
        let conn = self.write_conn();
        conn.execute("DELETE FROM patterns WHERE kb_id = ?1", params![kb_id])?;
        conn.execute("DELETE FROM lsh_postings WHERE kb_id = ?1", params![kb_id])?;
        Ok(())
    }
}

impl KvStore for SqliteBackend {
    fn incr_freq(&self, kb_id: &str, name: &str) -> Result<u64> {
        let conn = self.write_conn();
        conn.execute(
            "INSERT INTO pattern_kv (kb_id, name, freq) VALUES (?1, ?2, 1)
             ON CONFLICT(kb_id, name) DO UPDATE SET freq = freq + 1",
            params![kb_id, name],
        )?;
        let freq: i64 = conn.query_row(
            "SELECT freq FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
            params![kb_id, name],
            |row| row.get(0),
        )?;
        Ok(freq as u64)
    }

    fn get_freq(&self, kb_id: &str, name: &str) -> Result<Option<u64>> {
        let conn = self.read_conn();
        conn.query_row(
            "SELECT freq FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
            params![kb_id, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map(|v| v.map(|x| x as u64))
        .map_err(StorageError::from)
    }

    fn append_emotives(
        &self,
        kb_id: &str,
        name: &str,
        snapshot: &BTreeMap<String, f32>,
        persistence: usize,
    ) -> Result<Vec<BTreeMap<String, f32>>> {
        let conn = self.write_conn();
        conn.execute(
            "INSERT INTO pattern_kv (kb_id, name, freq, emotives_window) VALUES (?1, ?2, 1, '[]')
             ON CONFLICT(kb_id, name) DO NOTHING",
            params![kb_id, name],
        )?;

        if snapshot.is_empty() {
            let raw: String = conn.query_row(
                "SELECT emotives_window FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
                params![kb_id, name],
                |row| row.get(0),
            )?;
            return Ok(serde_json::from_str(&raw)?);
        }

        let raw: String = conn.query_row(
            "SELECT emotives_window FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
            params![kb_id, name],
            |row| row.get(0),
        )?;
        let mut window: Vec<BTreeMap<String, f32>> = serde_json::from_str(&raw)?;
        window.push(snapshot.clone());
        let persistence = persistence.max(1);
        if window.len() > persistence {
            let drop = window.len() - persistence;
            window.drain(0..drop);
        }

        let updated = serde_json::to_string(&window)?;
        conn.execute(
            "UPDATE pattern_kv SET emotives_window = ?1 WHERE kb_id = ?2 AND name = ?3",
            params![updated, kb_id, name],
        )?;
        Ok(window)
    }

    fn get_emotives(&self, kb_id: &str, name: &str) -> Result<Vec<BTreeMap<String, f32>>> {
        let conn = self.read_conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT emotives_window FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
                params![kb_id, name],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn union_metadata(
        &self,
        kb_id: &str,
        name: &str,
        metadata: &BTreeMap<String, HashSet<String>>,
    ) -> Result<BTreeMap<String, HashSet<String>>> {
        let conn = self.write_conn();
        conn.execute(
            "INSERT INTO pattern_kv (kb_id, name, freq, metadata) VALUES (?1, ?2, 1, '{}')
             ON CONFLICT(kb_id, name) DO NOTHING",
            params![kb_id, name],
        )?;

        let raw: String = conn.query_row(
            "SELECT metadata FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
            params![kb_id, name],
            |row| row.get(0),
        )?;
        let mut stored: BTreeMap<String, HashSet<String>> = serde_json::from_str(&raw)?;
        for (key, values) in metadata {
            stored.entry(key.clone()).or_default().extend(values.iter().cloned());
        }
        let updated = serde_json::to_string(&stored)?;
        conn.execute(
            "UPDATE pattern_kv SET metadata = ?1 WHERE kb_id = ?2 AND name = ?3",
            params![updated, kb_id, name],
        )?;
        Ok(stored)
    }

    fn get_metadata(&self, kb_id: &str, name: &str) -> Result<BTreeMap<String, HashSet<String>>> {
        let conn = self.read_conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT metadata FROM pattern_kv WHERE kb_id = ?1 AND name = ?2",
                params![kb_id, name],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn incr_symbol_frequencies(&self, kb_id: &str, symbols: &[&str]) -> Result<()> {
        let conn = self.write_conn();
        for symbol in symbols {
            conn.execute(
                "INSERT INTO symbol_freq (kb_id, symbol, freq) VALUES (?1, ?2, 1)
                 ON CONFLICT(kb_id, symbol) DO UPDATE SET freq = freq + 1",
                params![kb_id, symbol],
            )?;
        }
        Ok(())
    }

    fn symbol_frequency(&self, kb_id: &str, symbol: &str) -> Result<u64> {
        let conn = self.read_conn();
        conn.query_row(
            "SELECT freq FROM symbol_freq WHERE kb_id = ?1 AND symbol = ?2",
            params![kb_id, symbol],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map(|v| v.unwrap_or(0) as u64)
        .map_err(StorageError::from)
    }

    fn delete_pattern_keys(&self, kb_id: &str) -> Result<()> {
        let conn = self.write_conn();
        conn.execute("DELETE FROM pattern_kv WHERE kb_id = ?1", params![kb_id])?;
        conn.execute("DELETE FROM symbol_freq WHERE kb_id = ?1", params![kb_id])?;
        Ok(())
    }

    fn put_blob(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) -> Result<()> {
        let conn = self.write_conn();
        let expires_at = ttl_seconds.map(|s| (chrono::Utc::now() + chrono::Duration::seconds(s as i64)).to_rfc3339());
        conn.execute(
            "INSERT INTO kv_blob (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.read_conn();
        let row: Option<(Vec<u8>, Option<String>)> = conn
            .query_row(
                "SELECT value, expires_at FROM kv_blob WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((value, Some(expires_at))) => {
                let expires_at = chrono::DateTime::parse_from_rfc3339(&expires_at)
                    .map_err(|e| StorageError::Unavailable(e.to_string()))?;
                if expires_at < chrono::Utc::now() {
                    Ok(None)
                } else {
                    Ok(Some(value))
                }
            }
            Some((value, None)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn delete_blob(&self, key: &str) -> Result<()> {
        let conn = self.write_conn();
        conn.execute("DELETE FROM kv_blob WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.read_conn();
        let like = format!("{prefix}%");
        let mut stmt = conn.prepare("SELECT key FROM kv_blob WHERE key LIKE ?1")?;
        let rows = stmt.query_map(params![like], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<_, _>>().map_err(StorageError::from)
    }
}

/// Minimal ANN collaborator backed by the same SQLite database: stores raw
/// vectors and does a linear cosine scan at search time. Sufficient for the
/// write-time-only requirement (ANN is not required at
/// prediction time); not intended to replace a real ANN service at scale.
pub struct SqliteAnnService {
    backend: std::sync::Arc<SqliteBackend>,
}

impl SqliteAnnService {
    pub fn new(backend: std::sync::Arc<SqliteBackend>) -> Self {
        Self { backend }
    }
}

impl AnnService for SqliteAnnService {
    fn upsert(&self, kb_id: &str, point_id: &str, vector: &[f32], payload: AnnPayload) -> Result<()> {
        let conn = self.backend.write_conn();
        let vector_json = serde_json::to_string(vector)?;
        conn.execute(
            "INSERT INTO ann_vectors (kb_id, point_id, vector, symbol, pattern_name, event_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(kb_id, point_id) DO UPDATE SET vector = excluded.vector, symbol = excluded.symbol,
                pattern_name = excluded.pattern_name, event_index = excluded.event_index",
            params![kb_id, point_id, vector_json, payload.symbol, payload.pattern_name, payload.event_index],
        )?;
        Ok(())
    }

    fn search(&self, kb_id: &str, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        let conn = self.backend.read_conn();
        let mut stmt = conn.prepare("SELECT point_id, vector FROM ann_vectors WHERE kb_id = ?1")?;
        let rows = stmt.query_map(params![kb_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut scored: Vec<(String, f32)> = Vec::new();
        for row in rows {
            let (point_id, vector_json) = row?;
            let vector: Vec<f32> = serde_json::from_str(&vector_json)?;
            scored.push((point_id, cosine_similarity(query, &vector)));
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn drop_collection(&self, kb_id: &str) -> Result<()> {
        let conn = self.backend.write_conn();
        conn.execute("DELETE FROM ann_vectors WHERE kb_id = ?1", params![kb_id])?;
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{MinHashParams, PatternCore};

    fn core(events: Vec<Vec<&str>>) -> PatternCore {
        let events: Vec<Vec<String>> = events
            .into_iter()
            .map(|e| e.into_iter().map(String::from).collect())
            .collect();
        PatternCore::derive(events, MinHashParams::default())
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let c = core(vec![vec!["a", "b"]]);
        assert!(backend.insert_if_absent("kb1", &c).unwrap());
        assert!(!backend.insert_if_absent("kb1", &c).unwrap());
        assert_eq!(backend.count("kb1").unwrap(), 1);
    }

    #[test]
    fn fetch_one_returns_persisted_timestamps_not_now() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let c = core(vec![vec!["a", "b"]]);
        backend.insert_if_absent("kb1", &c).unwrap();

        let first = backend.fetch_one("kb1", &c.name).unwrap().unwrap();
        assert!(first.created_at.is_some());
        assert_eq!(first.created_at, first.updated_at);

        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = backend.fetch_one("kb1", &c.name).unwrap().unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.updated_at, first.updated_at, "re-fetching without writing must not change timestamps");

        // A re-learn (insert_if_absent on an existing row) bumps updated_at
        // but leaves created_at untouched.
        backend.insert_if_absent("kb1", &c).unwrap();
        let third = backend.fetch_one("kb1", &c.name).unwrap().unwrap();
        assert_eq!(third.created_at, first.created_at);
        assert!(third.updated_at > first.updated_at);
    }

    #[test]
    fn kb_isolation_on_count() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let c = core(vec![vec!["a"]]);
        backend.insert_if_absent("kb1", &c).unwrap();
        assert_eq!(backend.count("kb2").unwrap(), 0);
    }

    #[test]
    fn freq_increments_atomically_in_sequence() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert_eq!(backend.incr_freq("kb1", "n").unwrap(), 1);
        assert_eq!(backend.incr_freq("kb1", "n").unwrap(), 2);
        assert_eq!(backend.get_freq("kb1", "n").unwrap(), Some(2));
    }

    #[test]
    fn emotives_window_trims_to_persistence() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        for i in 0..5 {
            let mut snap = BTreeMap::new();
            snap.insert("x".to_string(), i as f32 / 10.0);
            backend.append_emotives("kb1", "n", &snap, 3).unwrap();
        }
        let window = backend.get_emotives("kb1", "n").unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0]["x"], 0.2);
        assert_eq!(window[2]["x"], 0.4);
    }

    #[test]
    fn metadata_is_set_union() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let mut m1 = BTreeMap::new();
        m1.insert("tags".to_string(), HashSet::from(["a".to_string()]));
        backend.union_metadata("kb1", "n", &m1).unwrap();
        let mut m2 = BTreeMap::new();
        m2.insert("tags".to_string(), HashSet::from(["b".to_string()]));
        let merged = backend.union_metadata("kb1", "n", &m2).unwrap();
        assert_eq!(merged["tags"], HashSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn bulk_delete_drops_partition() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let c = core(vec![vec!["a"]]);
        backend.insert_if_absent("kb1", &c).unwrap();
        backend.incr_freq("kb1", &c.name).unwrap();
        backend.drop_partition("kb1").unwrap();
        backend.delete_pattern_keys("kb1").unwrap();
        assert_eq!(backend.count("kb1").unwrap(), 0);
        assert_eq!(backend.get_freq("kb1", &c.name).unwrap(), None);
    }

    #[test]
    fn candidates_by_bands_unions_postings() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let c = core(vec![vec!["a", "b", "c"]]);
        backend.insert_if_absent("kb1", &c).unwrap();
        let candidates = backend.candidates_by_bands("kb1", &c.lsh_bands).unwrap();
        assert!(candidates.contains(&c.name));
    }
}
