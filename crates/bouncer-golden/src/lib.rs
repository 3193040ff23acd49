//! Golden test infrastructure for the bounce calls
//!
//! A corpus case records one call: the method, its JSON request and,
//! optionally, the call metadata it carried. The runner replays the case
//! through [`bouncer_core::dispatch`] and compares the outcome (the response
//! body, or the failure status and message) with a stored snapshot.
//!
//! Set `UPDATE_GOLDEN=1` to record missing snapshots and overwrite stale ones.

pub mod corpus;
pub mod diff;
pub mod runner;
pub mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

pub use corpus::{CorpusManager, CorpusStatistics, TestCase};
pub use diff::{DiffEngine, DiffOptions, DiffResult};
pub use runner::{BatchSummary, CallOutcome, GoldenTestRunner, TestResult};
pub use snapshot::{Snapshot, SnapshotManager};

/// Corpus checked into the workspace root
const WORKSPACE_CORPUS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../golden-corpus");

#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    #[error("Corpus error: {0}")]
    CorpusError(String),

    #[error("Test failed: {0}")]
    TestFailed(String),
}

pub type Result<T> = std::result::Result<T, GoldenError>;

#[derive(Debug, Clone)]
pub struct GoldenConfig {
    /// Root of the case directories
    pub corpus_dir: PathBuf,

    pub snapshot_dir: PathBuf,

    /// Overwrite snapshots that no longer match
    pub update_snapshots: bool,

    /// Record a snapshot for cases that have none
    pub create_missing: bool,

    pub diff_options: DiffOptions,

    /// Print every result, not only failures
    pub verbose: bool,
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self::rooted_at(WORKSPACE_CORPUS)
    }
}

impl GoldenConfig {
    /// Corpus and `snapshots/` below one root directory, nothing updated
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            snapshot_dir: root.join("snapshots"),
            corpus_dir: root,
            update_snapshots: false,
            create_missing: false,
            diff_options: DiffOptions::default(),
            verbose: false,
        }
    }

    /// The workspace corpus, adjusted by `GOLDEN_*` and `UPDATE_GOLDEN`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(corpus_dir) = std::env::var("GOLDEN_CORPUS_DIR") {
            config.snapshot_dir = PathBuf::from(&corpus_dir).join("snapshots");
            config.corpus_dir = PathBuf::from(corpus_dir);
        }
        if let Ok(snapshot_dir) = std::env::var("GOLDEN_SNAPSHOT_DIR") {
            config.snapshot_dir = PathBuf::from(snapshot_dir);
        }

        let update = env_flag("UPDATE_GOLDEN").unwrap_or(false);
        config.update_snapshots = update;
        config.create_missing = update;
        config.verbose = env_flag("GOLDEN_VERBOSE").unwrap_or(false);
        config.diff_options.colored = !env_flag("NO_COLOR").unwrap_or(false);

        config
    }
}

/// Replay one case of the workspace corpus, panicking with the diff on failure
pub fn assert_case(id: &str) {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());
    if let Err(err) = runner.run_test(id) {
        panic!("Golden case {} failed: {}", id, err);
    }
}

/// Replay every case matching `pattern`, panicking if any fails
pub fn assert_cases(pattern: &str) {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());
    if let Err(err) = runner.run_batch(pattern) {
        panic!("Golden cases matching '{}' failed: {}", pattern, err);
    }
}

/// Define a test that replays one corpus case
#[macro_export]
macro_rules! golden_test {
    ($name:ident, $case:expr) => {
        #[test]
        fn $name() {
            $crate::assert_case($case);
        }
    };
}

/// Define a test that replays every case matching a pattern
#[macro_export]
macro_rules! golden_test_batch {
    ($pattern:expr) => {
        #[test]
        fn golden_tests() {
            $crate::assert_cases($pattern);
        }
    };
}
