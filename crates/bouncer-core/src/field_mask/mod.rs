//! Field masks: dotted field paths selecting parts of an output record
//!
//! A [`FieldMask`] is the list of raw path strings as received. Before use it
//! is parsed into a [`MaskTree`], a trie of path segments in which a node
//! reached by a complete path keeps its whole subtree. Matching segments to
//! record fields is schema-aware and happens in [`filter`], so map keys are
//! compared verbatim while field names may use either their schema spelling
//! (`string_val`) or the JSON one (`stringVal`).
//!
//! # Example
//!
//! ```
//! use bouncer_core::field_mask::{FieldMask, MaskTree};
//!
//! let mask = FieldMask::new(["complex_value", "complex_value.int32_val", "string_val"]);
//! let tree = MaskTree::parse(&mask).unwrap();
//!
//! // The ancestor path wins: all of complex_value is kept.
//! assert!(tree.child("complex_value").unwrap().is_whole());
//! ```

pub mod filter;
pub mod schema;

pub use filter::prune;
pub use schema::{normalize_path, Cardinality, FieldDescriptor, MessageSchema};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered set of dot-delimited field paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a path unless it is already present
    pub fn append(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Trie of mask path segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskTree {
    /// A complete path ends here: keep everything below
    whole: bool,
    children: BTreeMap<String, MaskTree>,
}

impl MaskTree {
    /// Parse every path of a mask
    pub fn parse(mask: &FieldMask) -> Result<Self> {
        Self::from_paths(&mask.paths)
    }

    pub fn from_paths<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = MaskTree::default();
        for path in paths {
            let segments = split_path(path.as_ref())?;
            root.insert(&segments);
        }
        Ok(root)
    }

    fn insert(&mut self, segments: &[&str]) {
        let Some((first, rest)) = segments.split_first() else {
            self.whole = true;
            self.children.clear();
            return;
        };

        let child = self.children.entry((*first).to_string()).or_default();
        if child.whole {
            return;
        }
        child.insert(rest);
    }

    /// Fold another subtree into this one
    pub fn merge(&mut self, other: &MaskTree) {
        if self.whole {
            return;
        }
        if other.whole {
            self.whole = true;
            self.children.clear();
            return;
        }
        for (segment, subtree) in &other.children {
            self.children
                .entry(segment.clone())
                .or_default()
                .merge(subtree);
        }
    }

    /// True when this node keeps its entire subtree
    pub fn is_whole(&self) -> bool {
        self.whole
    }

    /// True for the root of a mask without paths
    pub fn is_empty(&self) -> bool {
        !self.whole && self.children.is_empty()
    }

    pub fn child(&self, segment: &str) -> Option<&MaskTree> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &MaskTree)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A node that keeps everything
    pub fn whole() -> Self {
        Self {
            whole: true,
            children: BTreeMap::new(),
        }
    }
}

/// Split a dotted path, rejecting empty paths and empty segments
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::invalid_field_mask(path, "path is empty"));
    }

    let segments: Vec<&str> = path.split('.').collect();
    if let Some(position) = segments.iter().position(|s| s.is_empty()) {
        return Err(Error::invalid_field_mask(
            path,
            format!("empty segment at position {}", position),
        ));
    }

    Ok(segments)
}
