//! # kato-core
//!
//! A deterministic, transparent sequence-learning and prediction engine.
//!
//! KATO ingests multi-modal observations (discrete symbols, vectors,
//! continuous emotive values, metadata tags) into a per-session short-term
//! memory buffer, learns content-addressed patterns from it, and at query
//! time retrieves past patterns whose event sequences overlap the current
//! buffer — segmenting each match into past/present/future and scoring it
//! against the buffer.
//!
//! ## Layout
//!
//! - [`symbol`] — event normalization and vector-to-symbol derivation.
//! - [`stm`] — the short-term memory buffer and its emotive/metadata
//!   aggregator.
//! - [`pattern`] — the pattern data model, content hasher, and MinHash/LSH
//!   signer.
//! - [`kb`] — the pattern knowledge base: the collaborator trait boundary
//!   (columnar store, KV store, ANN service), a bundled SQLite-backed
//!   implementation of all three, the pattern writer, and the read/write
//!   facade.
//! - [`search`] — the multi-stage candidate filter pipeline and the
//!   subsequence matcher it drives.
//! - [`predict`] — temporal segmentation, the metrics engine, and the
//!   ranker.
//! - [`processor`] — the session-bound orchestrator tying the above into
//!   `observe`/`learn`/`get_predictions`.
//! - [`session`] — session lifecycle (create/get/extend/delete/gc) backed
//!   by the KV collaborator.
//! - [`config`] — the recognized session configuration surface.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use kato_core::config::ProcessorConfig;
//! use kato_core::kb::{KnowledgeBase, SqliteAnnService, SqliteBackend};
//! use kato_core::processor::{Observation, Processor};
//!
//! let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
//! let ann = Arc::new(SqliteAnnService::new(backend.clone()));
//! let kb = Arc::new(KnowledgeBase::new(backend.clone(), backend, ann));
//!
//! let mut processor = Processor::new(kb, "demo".to_string(), ProcessorConfig::default(), 768);
//! processor.observe(Observation { strings: vec!["a".into(), "b".into()], ..Default::default() }).unwrap();
//! processor.learn().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod kb;
pub mod pattern;
pub mod predict;
pub mod processor;
pub mod search;
pub mod session;
pub mod stm;
pub mod symbol;

pub use error::{KatoError, Result};
pub use pattern::{Event, EventSequence, Pattern, PatternCore};

/// Crate version, exposed for diagnostics/health endpoints built on top of
/// this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::config::{ProcessorConfig, ProcessorConfigPatch, RankSortAlgo};
    pub use crate::error::{KatoError, Result};
    pub use crate::kb::{KnowledgeBase, SqliteAnnService, SqliteBackend};
    pub use crate::pattern::{Event, EventSequence, Pattern};
    pub use crate::predict::Prediction;
    pub use crate::processor::{Observation, ObserveOutcome, Processor};
    pub use crate::session::{SessionHeader, SessionManager};
    pub use crate::stm::StmMode;
}
