//! Replays corpus cases and checks them against their snapshots

use crate::corpus::{CorpusManager, CorpusStatistics, TestCase};
use crate::diff::DiffEngine;
use crate::snapshot::{Snapshot, SnapshotManager};
use crate::{GoldenConfig, GoldenError, Result};
use bouncer_core::{dispatch, BounceService, Error as CallError, StatusCode};
use colored::Colorize;
use serde_json::{json, Value};
use std::fmt;
use std::time::{Duration, Instant};

/// What a replayed call produced
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Response(Value),
    Failure { status: StatusCode, message: String },
}

impl CallOutcome {
    pub fn failure(err: &CallError) -> Self {
        Self::Failure {
            status: err.code(),
            message: err.to_string(),
        }
    }

    /// The value stored in a snapshot
    pub fn to_content(&self) -> Value {
        match self {
            Self::Response(body) => body.clone(),
            Self::Failure { status, message } => {
                json!({"status": status.to_string(), "message": message})
            }
        }
    }
}

#[derive(Debug)]
pub struct TestResult {
    /// Case id
    pub name: String,

    pub passed: bool,

    /// Disabled cases pass without being replayed
    pub skipped: bool,

    pub error: Option<String>,

    pub diff: Option<String>,

    pub duration: Duration,

    /// The snapshot was written during this run
    pub updated: bool,
}

impl TestResult {
    fn errored(name: &str, err: &GoldenError, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            skipped: false,
            error: Some(err.to_string()),
            diff: None,
            duration,
            updated: false,
        }
    }

    pub fn print(&self, verbose: bool) {
        let status = if self.skipped {
            "SKIP".yellow().bold()
        } else if self.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!("{} {} ({}ms)", status, self.name, self.duration.as_millis());

        if let Some(error) = &self.error {
            println!("  {}: {}", "Error".red(), error);
        }
        if verbose || !self.passed {
            if let Some(diff) = &self.diff {
                println!("{}", diff);
            }
        }
        if self.updated {
            println!("  {}", "Snapshot written".yellow());
        }
    }
}

/// Totals of one batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub updated: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} snapshots written",
            self.passed, self.failed, self.skipped, self.updated
        )
    }
}

struct Verdict {
    passed: bool,
    diff: Option<String>,
    updated: bool,
}

impl Verdict {
    fn pass(updated: bool) -> Self {
        Self {
            passed: true,
            diff: None,
            updated,
        }
    }
}

pub struct GoldenTestRunner {
    config: GoldenConfig,
    corpus: CorpusManager,
    snapshots: SnapshotManager,
    service: BounceService,
}

impl GoldenTestRunner {
    pub fn new(config: GoldenConfig) -> Self {
        Self {
            corpus: CorpusManager::new(&config.corpus_dir),
            snapshots: SnapshotManager::new(&config.snapshot_dir),
            service: BounceService::new(),
            config,
        }
    }

    /// Replay one case by id; a failed check is an error carrying the diff
    pub fn run_test(&self, id: &str) -> Result<TestResult> {
        let case = self.corpus.load(id)?;
        let result = self.run_case(&case);

        if self.config.verbose {
            result.print(true);
        }
        if result.passed {
            return Ok(result);
        }

        let mut message = format!(
            "{}: {}",
            id,
            result.error.as_deref().unwrap_or("snapshot mismatch")
        );
        if let Some(diff) = &result.diff {
            message.push('\n');
            message.push_str(diff);
        }
        Err(GoldenError::TestFailed(message))
    }

    pub fn run_case(&self, case: &TestCase) -> TestResult {
        let id = case.id();
        let start = Instant::now();

        if !case.metadata.enabled {
            return TestResult {
                name: id,
                passed: true,
                skipped: true,
                error: None,
                diff: None,
                duration: Duration::ZERO,
                updated: false,
            };
        }

        match self.evaluate(case) {
            Ok(verdict) => TestResult {
                error: (!verdict.passed).then(|| "snapshot mismatch".to_string()),
                name: id,
                passed: verdict.passed,
                skipped: false,
                diff: verdict.diff,
                duration: start.elapsed(),
                updated: verdict.updated,
            },
            Err(err) => TestResult::errored(&id, &err, start.elapsed()),
        }
    }

    fn evaluate(&self, case: &TestCase) -> Result<Verdict> {
        let outcome = self.replay(case)?;
        let id = case.id();

        let Some(snapshot) = self.snapshots.load(&id)? else {
            if !(self.config.create_missing || self.config.update_snapshots) {
                return Err(GoldenError::SnapshotMismatch(format!(
                    "no snapshot for '{}'. Run with UPDATE_GOLDEN=1 to record it",
                    id
                )));
            }
            let snapshot = Snapshot::new(
                id,
                outcome.to_content(),
                Some(case.metadata.description.clone()),
                case.metadata.tags.clone(),
            );
            self.snapshots.save(&snapshot)?;
            return Ok(Verdict::pass(true));
        };

        let mut engine = DiffEngine::new(self.config.diff_options.clone());
        engine.ignore(&snapshot.ignore_fields)?;
        engine.ignore(&case.expectations.ignore_fields)?;
        for field in &case.expectations.volatile_fields {
            engine.add_volatile_pattern(&field.path, &field.pattern)?;
        }

        let content = outcome.to_content();
        let diff = engine.compare(&snapshot.content, &content);
        if diff.matches {
            return Ok(Verdict::pass(false));
        }

        if self.config.update_snapshots {
            self.snapshots.replace(snapshot, content)?;
            return Ok(Verdict {
                passed: true,
                diff: Some(diff.diff_output),
                updated: true,
            });
        }

        Ok(Verdict {
            passed: false,
            diff: Some(format!(
                "differs at: {}\n{}",
                diff.differing_paths.join(", "),
                diff.diff_output
            )),
            updated: false,
        })
    }

    /// Dispatch the recorded call and hold it to the case's expectations
    fn replay(&self, case: &TestCase) -> Result<CallOutcome> {
        let method = case.input.method()?;
        let metadata = case.input.metadata();
        let expectations = &case.expectations;

        let result = dispatch(&self.service, method, &case.input.request, metadata.as_ref());
        match (result, expectations.should_succeed) {
            (Ok(body), true) => Ok(CallOutcome::Response(body)),
            (Ok(_), false) => Err(GoldenError::TestFailed(format!(
                "{} succeeded but was expected to fail",
                method
            ))),
            (Err(err), true) => Err(GoldenError::TestFailed(format!(
                "{} failed with {}: {}",
                method,
                err.code(),
                err
            ))),
            (Err(err), false) => {
                expectations.check_failure(&err)?;
                Ok(CallOutcome::failure(&err))
            }
        }
    }

    /// Replay every case selected by `pattern`; any failure fails the batch
    pub fn run_batch(&self, pattern: &str) -> Result<BatchSummary> {
        let cases = self.corpus.select(pattern)?;
        println!("Running {} golden cases...\n", cases.len());

        let mut summary = BatchSummary::default();
        for case in &cases {
            let result = self.run_case(case);
            result.print(self.config.verbose);

            if result.skipped {
                summary.skipped += 1;
            } else if result.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            if result.updated {
                summary.updated += 1;
            }
        }

        println!("\n{} {}", "Summary:".bold(), summary);
        if summary.failed > 0 {
            return Err(GoldenError::TestFailed(format!(
                "{} of {} golden cases failed",
                summary.failed,
                cases.len()
            )));
        }
        Ok(summary)
    }

    pub fn init_corpus(&self) -> Result<()> {
        self.corpus.init_corpus()
    }

    /// Ids in run order
    pub fn list_tests(&self) -> Result<Vec<String>> {
        Ok(self
            .corpus
            .discover_tests()?
            .iter()
            .map(TestCase::id)
            .collect())
    }

    pub fn statistics(&self) -> Result<CorpusStatistics> {
        self.corpus.statistics()
    }
}
