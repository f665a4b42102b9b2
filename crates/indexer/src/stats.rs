use codeqa_chunker::ChunkKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const MAX_WARNINGS: usize = 50;

/// Outcome of one indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Files discovered
    pub files: usize,

    /// Chunks stored (placeholders included)
    pub total_chunks: usize,

    pub chunks_by_kind: BTreeMap<ChunkKind, usize>,

    /// Chunks with a real embedding
    pub embedded: usize,

    /// Chunks stored with a zero placeholder vector
    pub provider_errors: usize,

    pub discovery_errors: usize,

    pub extraction_errors: usize,

    /// Syntactic chunks over the byte budget
    pub oversized_dropped: usize,

    /// First failures, in order
    pub warnings: Vec<String>,

    pub elapsed_ms: u64,
}

impl IndexReport {
    pub(crate) fn add_warning(&mut self, warning: impl fmt::Display) {
        if self.warnings.len() < MAX_WARNINGS {
            self.warnings.push(warning.to_string());
        }
    }

    /// Per-file and per-chunk failures contained during the run
    #[must_use]
    pub const fn failures(&self) -> usize {
        self.provider_errors + self.discovery_errors + self.extraction_errors
    }

    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "indexed {}/{} chunks, {} embedding failures",
            self.embedded, self.total_chunks, self.provider_errors
        );
        if self.discovery_errors + self.extraction_errors > 0 {
            line.push_str(&format!(
                ", {} unreadable files",
                self.discovery_errors + self.extraction_errors
            ));
        }
        line
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
