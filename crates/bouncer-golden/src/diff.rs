//! Comparison of a recorded outcome with a fresh one
//!
//! Both sides first lose their ignored paths and have volatile strings
//! replaced by a fixed marker. Numbers then compare within a relative
//! tolerance, everything else exactly. A mismatch is reported as the list
//! of differing paths plus a unified diff of the pretty-printed values.

use crate::{GoldenError, Result};
use bouncer_core::MaskTree;
use colored::Colorize;
use regex::Regex;
use serde_json::{Number, Value};
use similar::TextDiff;
use std::collections::BTreeSet;

const MASKED: &str = "<volatile>";

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub colored: bool,

    /// Relative, with a floor of 1 on the magnitude
    pub float_tolerance: f64,

    /// Unchanged lines around each hunk
    pub context_lines: usize,

    /// 0 shows the whole diff
    pub max_diff_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            colored: true,
            float_tolerance: 1e-6,
            context_lines: 3,
            max_diff_lines: 100,
        }
    }
}

#[derive(Debug)]
pub struct DiffResult {
    pub matches: bool,

    /// Empty on a match
    pub diff_output: String,

    pub differing_paths: Vec<String>,
}

pub struct DiffEngine {
    options: DiffOptions,
    ignored: MaskTree,
    volatile: Vec<(Vec<String>, Regex)>,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            options,
            ignored: MaskTree::default(),
            volatile: Vec::new(),
        }
    }

    /// Leave dotted `paths` out of the comparison; a path continues through lists
    pub fn ignore<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<()> {
        let tree = MaskTree::from_paths(paths)
            .map_err(|e| GoldenError::CorpusError(format!("Invalid ignored path: {}", e)))?;
        self.ignored.merge(&tree);
        Ok(())
    }

    /// Strings at `path` matching `pattern` compare equal to each other
    pub fn add_volatile_pattern(&mut self, path: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|e| {
            GoldenError::CorpusError(format!("Invalid volatile pattern '{}': {}", pattern, e))
        })?;
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.volatile.push((segments, regex));
        Ok(())
    }

    pub fn compare(&self, expected: &Value, actual: &Value) -> DiffResult {
        let expected = self.prepare(expected);
        let actual = self.prepare(actual);

        let mut paths = BTreeSet::new();
        self.collect_differences(&expected, &actual, "", &mut paths);

        if paths.is_empty() {
            return DiffResult {
                matches: true,
                diff_output: String::new(),
                differing_paths: Vec::new(),
            };
        }

        DiffResult {
            matches: false,
            diff_output: self.render(&expected, &actual),
            differing_paths: paths.into_iter().collect(),
        }
    }

    fn prepare(&self, value: &Value) -> Value {
        let mut value = value.clone();
        strip(&mut value, &self.ignored);
        for (path, pattern) in &self.volatile {
            mask(&mut value, path, pattern);
        }
        value
    }

    fn collect_differences(
        &self,
        expected: &Value,
        actual: &Value,
        path: &str,
        out: &mut BTreeSet<String>,
    ) {
        match (expected, actual) {
            (Value::Object(exp), Value::Object(act)) => {
                let keys: BTreeSet<&String> = exp.keys().chain(act.keys()).collect();
                for key in keys {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    match (exp.get(key), act.get(key)) {
                        (Some(e), Some(a)) => self.collect_differences(e, a, &child, out),
                        (Some(_), None) => {
                            out.insert(format!("{} (missing)", child));
                        }
                        (None, Some(_)) => {
                            out.insert(format!("{} (unexpected)", child));
                        }
                        (None, None) => {}
                    }
                }
            }
            (Value::Array(exp), Value::Array(act)) => {
                for (i, (e, a)) in exp.iter().zip(act).enumerate() {
                    self.collect_differences(e, a, &format!("{}[{}]", path, i), out);
                }
                if exp.len() != act.len() {
                    out.insert(format!("{} (length {} != {})", path, exp.len(), act.len()));
                }
            }
            (Value::Number(e), Value::Number(a)) => {
                if !approx_eq(e, a, self.options.float_tolerance) {
                    out.insert(leaf(path));
                }
            }
            (e, a) => {
                if e != a {
                    out.insert(leaf(path));
                }
            }
        }
    }

    fn render(&self, expected: &Value, actual: &Value) -> String {
        let expected = serde_json::to_string_pretty(expected).unwrap_or_default() + "\n";
        let actual = serde_json::to_string_pretty(actual).unwrap_or_default() + "\n";

        let unified = TextDiff::from_lines(&expected, &actual)
            .unified_diff()
            .context_radius(self.options.context_lines)
            .header("snapshot", "actual")
            .to_string();

        let mut output = String::new();
        for (n, line) in unified.lines().enumerate() {
            if self.options.max_diff_lines > 0 && n >= self.options.max_diff_lines {
                output.push_str("... (diff truncated)\n");
                break;
            }
            if self.options.colored {
                output.push_str(&paint(line));
            } else {
                output.push_str(line);
            }
            output.push('\n');
        }
        output
    }
}

fn leaf(path: &str) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.to_string()
    }
}

fn paint(line: &str) -> String {
    if line.starts_with("---") || line.starts_with("+++") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else {
        line.to_string()
    }
}

/// Integers compare exactly; anything involving a float within tolerance
pub fn approx_eq(expected: &Number, actual: &Number, tolerance: f64) -> bool {
    if !expected.is_f64() && !actual.is_f64() {
        return expected == actual;
    }
    match (expected.as_f64(), actual.as_f64()) {
        (Some(e), Some(a)) => (e - a).abs() <= tolerance * e.abs().max(1.0),
        _ => false,
    }
}

/// Remove every path the tree marks as whole, descending through lists
pub fn strip(value: &mut Value, tree: &MaskTree) {
    match value {
        Value::Object(map) => {
            for (segment, subtree) in tree.children() {
                if subtree.is_whole() {
                    map.remove(segment);
                } else if let Some(child) = map.get_mut(segment) {
                    strip(child, subtree);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                strip(item, tree);
            }
        }
        _ => {}
    }
}

fn mask(value: &mut Value, path: &[String], pattern: &Regex) {
    match value {
        Value::Array(items) => {
            for item in items {
                mask(item, path, pattern);
            }
        }
        Value::Object(map) => {
            let Some((first, rest)) = path.split_first() else {
                return;
            };
            if let Some(child) = map.get_mut(first) {
                mask(child, rest, pattern);
            }
        }
        Value::String(s) if path.is_empty() && pattern.is_match(s) => {
            *s = MASKED.to_string();
        }
        _ => {}
    }
}
