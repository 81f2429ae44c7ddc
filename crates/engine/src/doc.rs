use std::path::Path;

use crate::error::{EngineError, Result};
use crate::time::TimelineMs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Syntax tag attached to a snapshot or a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Go,
    Html,
    Css,
    Json,
    Markdown,
    #[default]
    Plain,
}

impl Language {
    /// Lowercase tag used in logs and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Python => "python",
            Self::Go => "go",
            Self::Html => "html",
            Self::Css => "css",
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Plain => "plain",
        }
    }
}

/// One discrete code state with its own display duration.
///
/// A snapshot is replaced wholesale on edit; no partial in-place mutation is
/// visible to other components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub code: String,
    /// Overrides the document language when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub duration_ms: TimelineMs,
}

impl Snapshot {
    /// Creates a validated snapshot.
    ///
    /// # Example
    /// ```
    /// use engine::doc::Snapshot;
    ///
    /// let snapshot = Snapshot::new("fn main() {}", None, 1_000).expect("valid");
    /// assert_eq!(snapshot.duration_ms, 1_000);
    /// assert!(Snapshot::new("", None, 0).is_err());
    /// ```
    pub fn new(code: impl Into<String>, language: Option<Language>, duration_ms: TimelineMs) -> Result<Self> {
        let snapshot = Self {
            code: code.into(),
            language,
            duration_ms,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.duration_ms <= 0 {
            return Err(EngineError::InvalidDuration {
                duration_ms: self.duration_ms,
            });
        }
        Ok(())
    }
}

/// Ordered sequence of snapshots forming one cyclic timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub snapshots: Vec<Snapshot>,
    /// Fallback language for snapshots without an override.
    pub language: Language,
}

impl Document {
    /// Creates an empty, unplayable document.
    pub fn new(language: Language) -> Self {
        Self {
            snapshots: Vec::new(),
            language,
        }
    }

    /// Returns total timeline duration in milliseconds.
    ///
    /// Recomputed on every call: snapshot edits change it without a separate
    /// invalidation step.
    pub fn total_duration_ms(&self) -> TimelineMs {
        self.snapshots
            .iter()
            .map(|snapshot| snapshot.duration_ms)
            .sum()
    }

    /// Resolves the language a snapshot renders with.
    pub fn effective_language(&self, snapshot: &Snapshot) -> Language {
        snapshot.language.unwrap_or(self.language)
    }

    /// Replaces `snapshots[index]` wholesale.
    ///
    /// The current playback time is not this type's concern: an edit that
    /// moves a timeline boundary across the playhead simply changes which
    /// snapshot the next lookup returns.
    pub fn replace_snapshot(&mut self, index: usize, snapshot: Snapshot) -> Result<()> {
        snapshot.validate()?;
        let slot = self.slot_mut(index)?;
        *slot = snapshot;
        Ok(())
    }

    /// Inserts a snapshot at `index` (may equal the current length).
    pub fn insert_snapshot(&mut self, index: usize, snapshot: Snapshot) -> Result<()> {
        snapshot.validate()?;
        if index > self.snapshots.len() {
            warn!(index, len = self.snapshots.len(), "insert rejected: index out of range");
            return Err(EngineError::InvalidIndex {
                index,
                len: self.snapshots.len(),
            });
        }
        self.snapshots.insert(index, snapshot);
        Ok(())
    }

    /// Removes and returns the snapshot at `index`.
    ///
    /// Removing the last snapshot leaves an empty, unplayable document.
    pub fn remove_snapshot(&mut self, index: usize) -> Result<Snapshot> {
        if index >= self.snapshots.len() {
            warn!(index, len = self.snapshots.len(), "remove rejected: index out of range");
            return Err(EngineError::InvalidIndex {
                index,
                len: self.snapshots.len(),
            });
        }
        let removed = self.snapshots.remove(index);
        debug!(index, remaining = self.snapshots.len(), "snapshot removed");
        Ok(removed)
    }

    /// Replaces the sequence with the permutation `order`.
    ///
    /// `order[i]` names the old index of the snapshot that ends up at
    /// position `i`. Durations travel with their snapshot: reordering the
    /// sequence reorders the timeline.
    ///
    /// # Example
    /// ```
    /// use engine::doc::{Document, Language, Snapshot};
    ///
    /// let mut doc = Document::new(Language::Rust);
    /// for (code, duration_ms) in [("a", 1_000), ("b", 2_000), ("c", 500)] {
    ///     doc.insert_snapshot(doc.snapshots.len(), Snapshot::new(code, None, duration_ms).expect("valid"))
    ///         .expect("in range");
    /// }
    ///
    /// doc.reorder(&[2, 0, 1]).expect("permutation");
    /// assert_eq!(doc.snapshots[0].code, "c");
    /// assert_eq!(doc.snapshots[0].duration_ms, 500);
    /// ```
    pub fn reorder(&mut self, order: &[usize]) -> Result<()> {
        let len = self.snapshots.len();
        if order.len() != len {
            warn!(expected = len, actual = order.len(), "reorder rejected: length mismatch");
            return Err(EngineError::InvalidOrder {
                reason: format!("expected {len} indices, got {}", order.len()),
            });
        }

        let mut seen = vec![false; len];
        for &old_index in order {
            if old_index >= len {
                warn!(old_index, len, "reorder rejected: index out of range");
                return Err(EngineError::InvalidOrder {
                    reason: format!("index {old_index} out of range (len {len})"),
                });
            }
            if seen[old_index] {
                warn!(old_index, "reorder rejected: duplicate index");
                return Err(EngineError::InvalidOrder {
                    reason: format!("index {old_index} appears more than once"),
                });
            }
            seen[old_index] = true;
        }

        let reordered: Vec<Snapshot> = order
            .iter()
            .map(|&old_index| self.snapshots[old_index].clone())
            .collect();
        self.snapshots = reordered;
        debug!(len, "snapshots reordered");
        Ok(())
    }

    /// Removes every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Loads a document from a JSON file and re-validates its invariants.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::DocIo {
            context: "failed to read document file",
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Self =
            serde_json::from_str(&contents).map_err(|source| EngineError::DocSerialization {
                path: path.to_path_buf(),
                source,
            })?;

        for (index, snapshot) in doc.snapshots.iter().enumerate() {
            if snapshot.duration_ms <= 0 {
                return Err(EngineError::InvalidDocFile {
                    reason: format!(
                        "snapshot {index} has non-positive duration {}ms",
                        snapshot.duration_ms
                    ),
                });
            }
        }

        debug!(path = %path.display(), snapshot_count = doc.snapshots.len(), "document loaded");
        Ok(doc)
    }

    /// Saves the document as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents =
            serde_json::to_string_pretty(self).map_err(|source| EngineError::DocSerialization {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::write(path, contents).map_err(|source| EngineError::DocIo {
            context: "failed to write document file",
            path: path.to_path_buf(),
            source,
        })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Snapshot> {
        let len = self.snapshots.len();
        match self.snapshots.get_mut(index) {
            Some(slot) => Ok(slot),
            None => {
                warn!(index, len, "edit rejected: index out of range");
                Err(EngineError::InvalidIndex { index, len })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Language, Snapshot};
    use crate::error::EngineError;

    fn sample_doc() -> Document {
        let mut doc = Document::new(Language::Rust);
        for (code, duration_ms) in [("one", 1_000), ("two", 2_000), ("three", 500)] {
            doc.insert_snapshot(
                doc.snapshots.len(),
                Snapshot::new(code, None, duration_ms).expect("valid snapshot"),
            )
            .expect("in-range insert");
        }
        doc
    }

    #[test]
    fn total_duration_sums_all_snapshots() {
        assert_eq!(sample_doc().total_duration_ms(), 3_500);
        assert_eq!(Document::new(Language::Plain).total_duration_ms(), 0);
    }

    #[test]
    fn snapshot_new_rejects_non_positive_duration() {
        assert!(matches!(
            Snapshot::new("x", None, 0),
            Err(EngineError::InvalidDuration { duration_ms: 0 })
        ));
        assert!(matches!(
            Snapshot::new("x", None, -5),
            Err(EngineError::InvalidDuration { duration_ms: -5 })
        ));
    }

    #[test]
    fn replace_snapshot_rejects_out_of_range_index_without_clamping() {
        let mut doc = sample_doc();
        let replacement = Snapshot::new("late", None, 100).expect("valid snapshot");

        let result = doc.replace_snapshot(3, replacement);

        assert!(matches!(
            result,
            Err(EngineError::InvalidIndex { index: 3, len: 3 })
        ));
        assert_eq!(doc.snapshots[2].code, "three");
    }

    #[test]
    fn replace_snapshot_rejects_invalid_duration_before_touching_the_doc() {
        let mut doc = sample_doc();
        let bad = Snapshot {
            code: String::from("bad"),
            language: None,
            duration_ms: 0,
        };

        assert!(doc.replace_snapshot(0, bad).is_err());
        assert_eq!(doc.snapshots[0].code, "one");
        assert_eq!(doc.total_duration_ms(), 3_500);
    }

    #[test]
    fn effective_language_prefers_the_snapshot_override() {
        let doc = sample_doc();
        let plain = Snapshot::new("x", Some(Language::Python), 10).expect("valid snapshot");

        assert_eq!(doc.effective_language(&doc.snapshots[0]), Language::Rust);
        assert_eq!(doc.effective_language(&plain), Language::Python);
    }

    #[test]
    fn reorder_moves_durations_with_their_snapshots() {
        let mut doc = sample_doc();

        doc.reorder(&[2, 0, 1]).expect("valid permutation");

        let codes: Vec<&str> = doc
            .snapshots
            .iter()
            .map(|snapshot| snapshot.code.as_str())
            .collect();
        assert_eq!(codes, vec!["three", "one", "two"]);
        assert_eq!(doc.snapshots[0].duration_ms, 500);
        assert_eq!(doc.total_duration_ms(), 3_500);
    }

    #[test]
    fn reorder_rejects_length_mismatch_and_duplicates() {
        let mut doc = sample_doc();

        assert!(matches!(
            doc.reorder(&[0, 1]),
            Err(EngineError::InvalidOrder { .. })
        ));
        assert!(matches!(
            doc.reorder(&[0, 0, 1]),
            Err(EngineError::InvalidOrder { .. })
        ));
        assert!(matches!(
            doc.reorder(&[0, 1, 3]),
            Err(EngineError::InvalidOrder { .. })
        ));

        let codes: Vec<&str> = doc
            .snapshots
            .iter()
            .map(|snapshot| snapshot.code.as_str())
            .collect();
        assert_eq!(codes, vec!["one", "two", "three"]);
    }

    #[test]
    fn load_rejects_documents_with_non_positive_durations() {
        let dir = std::env::temp_dir();
        let path = dir.join("engine-doc-invalid-duration.json");
        std::fs::write(
            &path,
            r#"{"snapshots":[{"code":"x","duration_ms":0}],"language":"rust"}"#,
        )
        .expect("write fixture");

        let result = Document::load(&path);

        assert!(matches!(result, Err(EngineError::InvalidDocFile { .. })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_reports_missing_file_with_path_context() {
        let result = Document::load("/nonexistent/engine-doc.json");
        assert!(matches!(result, Err(EngineError::DocIo { .. })));
    }

    #[test]
    fn save_then_load_preserves_the_document() {
        let doc = sample_doc();
        let path = std::env::temp_dir().join("engine-doc-roundtrip.json");

        doc.save(&path).expect("save document");
        let loaded = Document::load(&path).expect("load document");

        assert_eq!(loaded, doc);
        let _ = std::fs::remove_file(&path);
    }
}
