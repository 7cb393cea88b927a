//! Durable learning store
//!
//! SQLite-backed persistence with two logical tables: verbatim LLM
//! classifications and generalized phonetic-family patterns. All pattern
//! counter updates are additive `ON CONFLICT` upserts, so concurrent writers
//! generalizing the same family never overwrite each other's counts.

use crate::pattern::{LearnedPattern, StoredClassification};
use chrono::{DateTime, Utc};
use namesift_core::{Error, Ethnicity, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

/// SQLite store for learned classifications and patterns
pub struct LearningStore {
    conn: Arc<Mutex<Connection>>,
}

impl LearningStore {
    /// Open or create the store at a specific path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::cache(format!("failed to open learning store {:?}: {}", path, e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store for tests and ephemeral sessions
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::cache(format!("failed to open in-memory store: {}", e)))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS llm_classifications (
                name TEXT PRIMARY KEY,
                ethnicity TEXT NOT NULL,
                confidence REAL NOT NULL,
                provider TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .map_err(sql_err)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS learned_patterns (
                pattern_key TEXT PRIMARY KEY,
                ethnicity TEXT NOT NULL,
                confidence REAL NOT NULL,
                confirmation_count INTEGER NOT NULL,
                total_applications INTEGER NOT NULL DEFAULT 0,
                success_rate REAL NOT NULL,
                created_from_session TEXT NOT NULL,
                last_applied_at TEXT
            )
            "#,
            [],
        )
        .map_err(sql_err)?;

        Ok(())
    }

    /// Persist a verbatim LLM classification (last writer wins)
    pub fn put_classification(&self, record: &StoredClassification) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO llm_classifications (name, ethnicity, confidence, provider, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
                ethnicity = excluded.ethnicity,
                confidence = excluded.confidence,
                provider = excluded.provider,
                created_at = excluded.created_at
            "#,
            params![
                record.name,
                record.ethnicity.label(),
                record.confidence,
                record.provider,
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    /// Upsert a pattern confirmation.
    ///
    /// The confirmation count is incremented in SQL, not written absolutely;
    /// ethnicity, confidence, and success rate follow the caller's computed
    /// values (last writer wins, which the concurrency model permits).
    pub fn confirm_pattern(&self, pattern: &LearnedPattern) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO learned_patterns
                (pattern_key, ethnicity, confidence, confirmation_count,
                 total_applications, success_rate, created_from_session, last_applied_at)
            VALUES (?1, ?2, ?3, 1, 0, ?4, ?5, NULL)
            ON CONFLICT(pattern_key) DO UPDATE SET
                confirmation_count = learned_patterns.confirmation_count + 1,
                ethnicity = excluded.ethnicity,
                confidence = excluded.confidence,
                success_rate = excluded.success_rate
            "#,
            params![
                pattern.pattern_key,
                pattern.ethnicity.label(),
                pattern.confidence,
                pattern.success_rate,
                pattern.created_from_session,
            ],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    /// Record that a pattern served a lookup (additive)
    pub fn record_application(&self, pattern_key: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            UPDATE learned_patterns
            SET total_applications = total_applications + 1,
                last_applied_at = ?2
            WHERE pattern_key = ?1
            "#,
            params![pattern_key, at.to_rfc3339()],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    /// Fetch one pattern row
    pub fn get_pattern(&self, pattern_key: &str) -> Result<Option<LearnedPattern>> {
        let conn = self.conn.lock();
        conn.query_row(
            r#"
            SELECT pattern_key, ethnicity, confidence, confirmation_count,
                   total_applications, success_rate, created_from_session, last_applied_at
            FROM learned_patterns WHERE pattern_key = ?1
            "#,
            params![pattern_key],
            row_to_pattern,
        )
        .optional()
        .map_err(sql_err)
    }

    /// Load every stored classification and pattern, for warming the
    /// in-memory read-through layer at startup
    pub fn load_all(&self) -> Result<(Vec<StoredClassification>, Vec<LearnedPattern>)> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT name, ethnicity, confidence, provider, created_at FROM llm_classifications")
            .map_err(sql_err)?;
        let classifications = stmt
            .query_map([], |row| {
                Ok(StoredClassification {
                    name: row.get(0)?,
                    ethnicity: parse_ethnicity(&row.get::<_, String>(1)?),
                    confidence: row.get(2)?,
                    provider: row.get(3)?,
                    created_at: parse_timestamp(&row.get::<_, String>(4)?),
                })
            })
            .map_err(sql_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sql_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT pattern_key, ethnicity, confidence, confirmation_count, \
                 total_applications, success_rate, created_from_session, last_applied_at \
                 FROM learned_patterns",
            )
            .map_err(sql_err)?;
        let patterns = stmt
            .query_map([], row_to_pattern)
            .map_err(sql_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sql_err)?;

        Ok((classifications, patterns))
    }

    /// Number of verbatim classifications stored
    pub fn count_classifications(&self) -> Result<u64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM llm_classifications", [], |r| r.get(0))
            .map_err(sql_err)
    }

    /// Number of distinct patterns stored
    pub fn count_patterns(&self) -> Result<u64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM learned_patterns", [], |r| r.get(0))
            .map_err(sql_err)
    }
}

fn row_to_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<LearnedPattern> {
    Ok(LearnedPattern {
        pattern_key: row.get(0)?,
        ethnicity: parse_ethnicity(&row.get::<_, String>(1)?),
        confidence: row.get(2)?,
        confirmation_count: row.get(3)?,
        total_applications: row.get(4)?,
        success_rate: row.get(5)?,
        created_from_session: row.get(6)?,
        last_applied_at: row
            .get::<_, Option<String>>(7)?
            .map(|s| parse_timestamp(&s)),
    })
}

fn parse_ethnicity(label: &str) -> Ethnicity {
    Ethnicity::parse_loose(label).unwrap_or(Ethnicity::Unknown)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn sql_err(e: rusqlite::Error) -> Error {
    Error::cache(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pattern(key: &str) -> LearnedPattern {
        LearnedPattern::new(key, Ethnicity::African, 0.85, "session-1")
    }

    #[test]
    fn classification_round_trip() {
        let store = LearningStore::open_in_memory().unwrap();
        let record = StoredClassification {
            name: "gxowa".into(),
            ethnicity: Ethnicity::African,
            confidence: 0.85,
            provider: Some("openai".into()),
            created_at: Utc::now(),
        };
        store.put_classification(&record).unwrap();

        let (classifications, _) = store.load_all().unwrap();
        assert_eq!(classifications.len(), 1);
        assert_eq!(classifications[0].name, "gxowa");
        assert_eq!(classifications[0].ethnicity, Ethnicity::African);
    }

    #[test]
    fn pattern_confirmations_are_additive() {
        let store = LearningStore::open_in_memory().unwrap();
        let pattern = sample_pattern("g583");

        store.confirm_pattern(&pattern).unwrap();
        store.confirm_pattern(&pattern).unwrap();
        store.confirm_pattern(&pattern).unwrap();

        let loaded = store.get_pattern("g583").unwrap().unwrap();
        assert_eq!(loaded.confirmation_count, 3);
        assert_eq!(loaded.total_applications, 0);
    }

    #[test]
    fn applications_accumulate_without_touching_confirmations() {
        let store = LearningStore::open_in_memory().unwrap();
        store.confirm_pattern(&sample_pattern("n806")).unwrap();
        store.record_application("n806", Utc::now()).unwrap();
        store.record_application("n806", Utc::now()).unwrap();

        let loaded = store.get_pattern("n806").unwrap().unwrap();
        assert_eq!(loaded.confirmation_count, 1);
        assert_eq!(loaded.total_applications, 2);
        assert!(loaded.last_applied_at.is_some());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learning.db");

        {
            let store = LearningStore::open(&path).unwrap();
            store.confirm_pattern(&sample_pattern("p107")).unwrap();
        }

        let store = LearningStore::open(&path).unwrap();
        assert_eq!(store.count_patterns().unwrap(), 1);
        assert!(store.get_pattern("p107").unwrap().is_some());
    }
}
