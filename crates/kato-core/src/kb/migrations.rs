//! Schema migrations for the bundled SQLite collaborator.

/// A single migration step.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

/// All migrations, applied in order on first open.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Pattern bodies and LSH postings (columnar collaborator)",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Pattern roll-up state and symbol frequencies (KV collaborator)",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Generic KV blob table for session state",
        up: MIGRATION_V3_UP,
    },
    Migration {
        version: 4,
        description: "ANN vector collection (bundled stand-in collaborator)",
        up: MIGRATION_V4_UP,
    },
];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    kb_id TEXT NOT NULL,
    name TEXT NOT NULL,
    length INTEGER NOT NULL,
    token_count INTEGER NOT NULL,
    first_token TEXT NOT NULL,
    last_token TEXT NOT NULL,
    event_data TEXT NOT NULL,
    minhash TEXT NOT NULL,
    lsh_bands TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (kb_id, name)
);

CREATE TABLE IF NOT EXISTS lsh_postings (
    kb_id TEXT NOT NULL,
    band_index INTEGER NOT NULL,
    band_hash INTEGER NOT NULL,
    pattern_name TEXT NOT NULL,
    PRIMARY KEY (kb_id, band_index, band_hash, pattern_name)
);

CREATE INDEX IF NOT EXISTS idx_lsh_postings_lookup ON lsh_postings(kb_id, band_hash);
"#;

const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS pattern_kv (
    kb_id TEXT NOT NULL,
    name TEXT NOT NULL,
    freq INTEGER NOT NULL DEFAULT 1,
    emotives_window TEXT NOT NULL DEFAULT '[]',
    metadata TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (kb_id, name)
);

CREATE TABLE IF NOT EXISTS symbol_freq (
    kb_id TEXT NOT NULL,
    symbol TEXT NOT NULL,
    freq INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (kb_id, symbol)
);
"#;

const MIGRATION_V3_UP: &str = r#"
CREATE TABLE IF NOT EXISTS kv_blob (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    expires_at TEXT
);
"#;

const MIGRATION_V4_UP: &str = r#"
CREATE TABLE IF NOT EXISTS ann_vectors (
    kb_id TEXT NOT NULL,
    point_id TEXT NOT NULL,
    vector TEXT NOT NULL,
    symbol TEXT NOT NULL,
    pattern_name TEXT,
    event_index INTEGER,
    PRIMARY KEY (kb_id, point_id)
);
"#;
