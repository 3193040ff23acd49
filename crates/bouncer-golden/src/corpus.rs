//! The recorded call corpus
//!
//! A case lives at `<corpus>/<category>/<name>/test.json`; its id is
//! `<category>/<name>`, which is also the name of its snapshot. The request
//! is written inline, or as the name of a sibling `.json` file for bodies too
//! large to keep in the case file.

use crate::{GoldenError, Result};
use bouncer_core::{CallMetadata, Error as CallError, Method};
use colored::Colorize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File name of every case
pub const CASE_FILE: &str = "test.json";

/// Categories created by [`CorpusManager::init_corpus`]
pub const CATEGORIES: [&str; 6] = [
    "scalars",
    "wrappers",
    "struct",
    "masked-fields",
    "time",
    "passthrough",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,

    pub category: String,

    pub input: TestInput,

    #[serde(default)]
    pub expectations: TestExpectations,

    pub metadata: TestMetadata,
}

/// The call to replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestInput {
    /// Method name or full RPC path
    pub method: String,

    #[serde(default)]
    pub request: Value,

    /// `None` replays a call that arrived without metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_metadata: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExpectations {
    #[serde(default = "default_true")]
    pub should_succeed: bool,

    /// Status name (`DATA_LOSS`, ...) a failing call must report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Regex the failure message must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_pattern: Option<String>,

    /// Dotted paths left out of the comparison
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    #[serde(default)]
    pub volatile_fields: Vec<VolatileField>,
}

/// A string field whose value only has to match `pattern`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatileField {
    pub path: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMetadata {
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lower runs first
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u32 {
    100
}

impl Default for TestExpectations {
    fn default() -> Self {
        Self {
            should_succeed: true,
            error_code: None,
            error_pattern: None,
            ignore_fields: Vec::new(),
            volatile_fields: Vec::new(),
        }
    }
}

impl TestCase {
    /// `<category>/<name>`
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// `*` selects everything, `tag:<tag>` selects by tag, anything else
    /// selects ids containing it
    pub fn matches(&self, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix("tag:") {
            Some(tag) => self.metadata.tags.iter().any(|t| t == tag),
            None => self.id().contains(pattern),
        }
    }
}

impl TestInput {
    pub fn method(&self) -> Result<Method> {
        self.method
            .parse()
            .map_err(|e: CallError| GoldenError::CorpusError(e.to_string()))
    }

    pub fn metadata(&self) -> Option<CallMetadata> {
        self.call_metadata.as_ref().map(|entries| {
            let mut metadata = CallMetadata::new();
            for (key, values) in entries {
                for value in values {
                    metadata.insert(key, value.clone());
                }
            }
            metadata
        })
    }
}

impl TestExpectations {
    /// Check a failed call against the expected status and message
    pub fn check_failure(&self, err: &CallError) -> Result<()> {
        let status = err.code().to_string();
        if let Some(expected) = &self.error_code {
            if !expected.eq_ignore_ascii_case(&status) {
                return Err(GoldenError::TestFailed(format!(
                    "expected status {}, got {}: {}",
                    expected, status, err
                )));
            }
        }

        if let Some(pattern) = &self.error_pattern {
            let regex = Regex::new(pattern).map_err(|e| {
                GoldenError::CorpusError(format!("Invalid error pattern '{}': {}", pattern, e))
            })?;
            if !regex.is_match(&err.to_string()) {
                return Err(GoldenError::TestFailed(format!(
                    "error '{}' does not match '{}'",
                    err, pattern
                )));
            }
        }

        Ok(())
    }
}

pub struct CorpusManager {
    root: PathBuf,
}

fn is_snapshot_dir(entry: &DirEntry) -> bool {
    entry.depth() == 1 && entry.file_type().is_dir() && entry.file_name() == OsStr::new("snapshots")
}

impl CorpusManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn case_path(&self, id: &str) -> PathBuf {
        self.root.join(id).join(CASE_FILE)
    }

    /// Load a case by id
    pub fn load(&self, id: &str) -> Result<TestCase> {
        let path = self.case_path(id);
        if !path.exists() {
            return Err(GoldenError::CorpusError(format!(
                "No case '{}' at {}",
                id,
                path.display()
            )));
        }
        self.load_test_case(&path)
    }

    /// Load a case file, resolving a request given as a file name
    pub fn load_test_case(&self, path: &Path) -> Result<TestCase> {
        let mut case: TestCase = serde_json::from_str(&fs::read_to_string(path)?)?;

        if let Value::String(file_name) = &case.input.request {
            let case_dir = path.parent().ok_or_else(|| {
                GoldenError::CorpusError(format!("Case {} has no directory", path.display()))
            })?;
            let body = fs::read_to_string(case_dir.join(file_name))?;
            case.input.request = serde_json::from_str(&body)?;
        }

        Ok(case)
    }

    /// Write a case to its place in the corpus
    pub fn save(&self, case: &TestCase) -> Result<PathBuf> {
        let path = self.case_path(&case.id());
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut content = serde_json::to_string_pretty(case)?;
        content.push('\n');
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Every loadable case, lowest priority first, then by id
    ///
    /// Cases that fail to load are reported and skipped.
    pub fn discover_tests(&self) -> Result<Vec<TestCase>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut cases = Vec::new();
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| !is_snapshot_dir(entry));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || entry.file_name() != OsStr::new(CASE_FILE) {
                continue;
            }
            match self.load_test_case(entry.path()) {
                Ok(case) => cases.push(case),
                Err(e) => eprintln!(
                    "{} skipping {}: {}",
                    "warning:".yellow(),
                    entry.path().display(),
                    e
                ),
            }
        }

        cases.sort_by(|a, b| {
            a.metadata
                .priority
                .cmp(&b.metadata.priority)
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(cases)
    }

    /// Cases selected by `pattern` (see [`TestCase::matches`]); none is an error
    pub fn select(&self, pattern: &str) -> Result<Vec<TestCase>> {
        let selected: Vec<_> = self
            .discover_tests()?
            .into_iter()
            .filter(|case| case.matches(pattern))
            .collect();

        if selected.is_empty() {
            return Err(GoldenError::CorpusError(format!(
                "No cases match '{}' in {}",
                pattern,
                self.root.display()
            )));
        }
        Ok(selected)
    }

    /// Create the category directories and a first scalar case
    pub fn init_corpus(&self) -> Result<()> {
        for category in CATEGORIES {
            fs::create_dir_all(self.root.join(category))?;
        }
        self.save(&sample_case())?;
        Ok(())
    }

    pub fn list_categories(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut categories = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
            if path.is_dir() && name != "snapshots" {
                categories.push(name.to_string());
            }
        }
        categories.sort();
        Ok(categories)
    }

    pub fn statistics(&self) -> Result<CorpusStatistics> {
        Ok(CorpusStatistics::collect(&self.discover_tests()?))
    }
}

fn sample_case() -> TestCase {
    TestCase {
        name: "hello-world".to_string(),
        category: "scalars".to_string(),
        input: TestInput {
            method: Method::BounceScalars.name().to_string(),
            request: json!({"int32_val": 3, "string_val": "world", "bool_val": true}),
            call_metadata: None,
        },
        expectations: TestExpectations::default(),
        metadata: TestMetadata {
            description: "Doubling, negation and greeting of scalar fields".to_string(),
            tags: vec!["scalars".to_string(), "smoke".to_string()],
            enabled: true,
            priority: 1,
        },
    }
}

/// Case counts across the corpus
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    pub total: usize,
    pub disabled: usize,
    /// Cases recording a failed call
    pub expected_failures: usize,
    pub by_category: BTreeMap<String, usize>,
    /// Keyed by canonical method name, however the case spells it
    pub by_method: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

impl CorpusStatistics {
    pub fn collect(cases: &[TestCase]) -> Self {
        let mut stats = Self {
            total: cases.len(),
            ..Default::default()
        };

        for case in cases {
            if !case.metadata.enabled {
                stats.disabled += 1;
            }
            if !case.expectations.should_succeed {
                stats.expected_failures += 1;
            }

            let method = case
                .input
                .method()
                .map(|m| m.name().to_string())
                .unwrap_or_else(|_| case.input.method.clone());

            *stats.by_category.entry(case.category.clone()).or_default() += 1;
            *stats.by_method.entry(method).or_default() += 1;
            for tag in &case.metadata.tags {
                *stats.by_tag.entry(tag.clone()).or_default() += 1;
            }
        }

        stats
    }
}

impl fmt::Display for CorpusStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Corpus Statistics ===")?;
        writeln!(
            f,
            "Cases: {} ({} disabled, {} expected failures)",
            self.total, self.disabled, self.expected_failures
        )?;

        for (title, counts) in [
            ("category", &self.by_category),
            ("method", &self.by_method),
            ("tag", &self.by_tag),
        ] {
            if counts.is_empty() {
                continue;
            }
            writeln!(f, "\nBy {}:", title)?;
            for (key, count) in counts {
                writeln!(f, "  {}: {}", key, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bouncer_core::StatusCode;
    use tempfile::TempDir;

    fn case(name: &str, category: &str) -> TestCase {
        TestCase {
            name: name.to_string(),
            category: category.to_string(),
            input: TestInput {
                method: "/targetservice.Bouncer/Echo".to_string(),
                request: json!({}),
                call_metadata: None,
            },
            expectations: TestExpectations::default(),
            metadata: TestMetadata {
                description: name.to_string(),
                tags: vec!["echo".to_string()],
                enabled: true,
                priority: 1,
            },
        }
    }

    #[test]
    fn test_init_creates_categories_and_sample() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());
        manager.init_corpus().unwrap();

        assert!(temp_dir.path().join("masked-fields").is_dir());
        assert_eq!(manager.list_categories().unwrap(), {
            let mut sorted = CATEGORIES.to_vec();
            sorted.sort();
            sorted
        });

        let cases = manager.discover_tests().unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id(), "scalars/hello-world");
        assert_eq!(cases[0].input.method().unwrap(), Method::BounceScalars);
    }

    #[test]
    fn test_request_file_reference() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());

        let mut echo = case("echo", "passthrough");
        echo.input.request = json!("request.json");
        let path = manager.save(&echo).unwrap();
        fs::write(path.with_file_name("request.json"), r#"{"k": [1, 2]}"#).unwrap();

        let loaded = manager.load("passthrough/echo").unwrap();
        assert_eq!(loaded.input.request, json!({"k": [1, 2]}));
    }

    #[test]
    fn test_snapshot_dir_is_not_walked() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());
        manager.save(&case("a", "passthrough")).unwrap();

        let stray = temp_dir.path().join("snapshots/passthrough/a");
        fs::create_dir_all(&stray).unwrap();
        fs::write(stray.join(CASE_FILE), "not a case").unwrap();

        assert_eq!(manager.discover_tests().unwrap().len(), 1);
    }

    #[test]
    fn test_selection_patterns() {
        let echo = case("echo", "passthrough");
        assert!(echo.matches("*"));
        assert!(echo.matches("passthrough"));
        assert!(echo.matches("through/ec"));
        assert!(echo.matches("tag:echo"));
        assert!(!echo.matches("tag:time"));
        assert!(!echo.matches("scalars"));

        let temp_dir = TempDir::new().unwrap();
        let manager = CorpusManager::new(temp_dir.path());
        manager.save(&echo).unwrap();
        assert!(manager.select("scalars").is_err());
    }

    #[test]
    fn test_call_metadata_keys_are_lowercased() {
        let mut echo = case("headers", "passthrough");
        echo.input.call_metadata = Some(BTreeMap::from([(
            "X-Added".to_string(),
            vec!["a".to_string(), "b".to_string()],
        )]));

        let metadata = echo.input.metadata().unwrap();
        assert_eq!(metadata.get("x-added").unwrap(), ["a", "b"]);
        assert!(case("plain", "passthrough").input.metadata().is_none());
    }

    #[test]
    fn test_failure_expectations() {
        let expectations = TestExpectations {
            should_succeed: false,
            error_code: Some("data_loss".to_string()),
            error_pattern: Some("metadata$".to_string()),
            ..Default::default()
        };
        let err = CallError::DataLoss {
            message: "EchoHeaders: failed to get metadata".to_string(),
        };
        assert_eq!(err.code(), StatusCode::DataLoss);
        expectations.check_failure(&err).unwrap();

        let wrong = CallError::invalid_argument("tail", "missing");
        assert!(expectations.check_failure(&wrong).is_err());
    }

    #[test]
    fn test_statistics_use_canonical_method_names() {
        let mut failing = case("b", "passthrough");
        failing.expectations.should_succeed = false;
        let stats = CorpusStatistics::collect(&[case("a", "passthrough"), failing]);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.expected_failures, 1);
        assert_eq!(stats.by_method.get("Echo"), Some(&2));
        assert!(stats.to_string().contains("passthrough: 2"));
    }
}
