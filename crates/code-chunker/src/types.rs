use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Deterministic chunk identifier.
///
/// Derived from `(kind, source_path, anchor)` where the anchor is the symbol name for syntactic
/// chunks and the line span for file and block chunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    #[must_use]
    pub fn derive(kind: ChunkKind, source_path: &str, anchor: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(source_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(anchor.as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().take(16).map(|b| format!("{b:02x}")).collect();
        Self(hex)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Whole file that fits the chunk budget
    File,
    /// Line-accumulated slice of a file that exceeds the budget
    Block,
    /// Class, struct, enum or record declaration
    Class,
    /// Function or method
    Function,
    /// Interface, trait or protocol
    Interface,
}

impl ChunkKind {
    pub const ALL: [Self; 5] = [
        Self::File,
        Self::Block,
        Self::Class,
        Self::Function,
        Self::Interface,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Block => "block",
            Self::Class => "class",
            Self::Function => "function",
            Self::Interface => "interface",
        }
    }

    /// Class, function and interface chunks come from declaration extraction
    #[must_use]
    pub const fn is_syntactic(self) -> bool {
        matches!(self, Self::Class | Self::Function | Self::Interface)
    }

    /// Starting point of the importance heuristic
    #[must_use]
    pub const fn base_importance(self) -> f32 {
        match self {
            Self::Class => 0.80,
            Self::Interface => 0.75,
            Self::Function => 0.70,
            Self::File => 0.55,
            Self::Block => 0.45,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown chunk kind '{s}'"))
    }
}

/// Kind-specific chunk metadata.
///
/// A function chunk cannot carry file-only fields and vice versa; the chunk kind is the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkDetail {
    File { bytes: usize },
    Block { ordinal: usize },
    Class { symbol: String, complexity: u32 },
    Function { symbol: String, complexity: u32 },
    Interface { symbol: String },
}

impl ChunkDetail {
    #[must_use]
    pub const fn kind(&self) -> ChunkKind {
        match self {
            Self::File { .. } => ChunkKind::File,
            Self::Block { .. } => ChunkKind::Block,
            Self::Class { .. } => ChunkKind::Class,
            Self::Function { .. } => ChunkKind::Function,
            Self::Interface { .. } => ChunkKind::Interface,
        }
    }

    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Self::Class { symbol, .. }
            | Self::Function { symbol, .. }
            | Self::Interface { symbol } => Some(symbol),
            Self::File { .. } | Self::Block { .. } => None,
        }
    }

    #[must_use]
    pub const fn complexity(&self) -> Option<u32> {
        match self {
            Self::Class { complexity, .. } | Self::Function { complexity, .. } => Some(*complexity),
            Self::File { .. } | Self::Block { .. } | Self::Interface { .. } => None,
        }
    }
}

/// Metadata attached to every chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Language name (`rust`, `python`, `text`, ...)
    pub language: String,

    /// Framework detected in the source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Heuristic importance in `[0, 1]`
    pub importance: f32,

    /// Kind-specific fields
    pub detail: ChunkDetail,
}

impl ChunkMetadata {
    #[must_use]
    pub fn new(language: impl Into<String>, detail: ChunkDetail) -> Self {
        let importance = detail.kind().base_importance();
        Self {
            language: language.into(),
            framework: None,
            importance,
            detail,
        }
    }

    /// Builder: set framework tag
    #[must_use]
    pub fn framework(mut self, framework: Option<impl Into<String>>) -> Self {
        self.framework = framework.map(Into::into);
        self
    }

    /// Builder: set importance (clamped to `[0, 1]`)
    #[must_use]
    pub fn importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ChunkKind {
        self.detail.kind()
    }
}

/// An addressable unit of indexed source content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,

    /// Root-relative path with `/` separators
    pub source_path: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    pub content: String,

    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk; the id is derived from kind, path and symbol-or-position.
    ///
    /// Block anchors carry their ordinal too, since a hard-split line yields several blocks with
    /// the same line span.
    #[must_use]
    pub fn new(
        source_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
        content: String,
        metadata: ChunkMetadata,
    ) -> Self {
        let source_path = source_path.into();
        let anchor = match &metadata.detail {
            ChunkDetail::Block { ordinal } => format!("L{start_line}-{end_line}#{ordinal}"),
            detail => detail
                .symbol_name()
                .map_or_else(|| format!("L{start_line}-{end_line}"), ToString::to_string),
        };
        let id = ChunkId::derive(metadata.kind(), &source_path, &anchor);
        Self {
            id,
            source_path,
            start_line,
            end_line,
            content,
            metadata,
        }
    }

    /// Re-derive the id with the position appended to the anchor.
    ///
    /// Used when two declarations in one file share a name.
    pub fn anchor_at_position(&mut self) {
        let symbol = self.metadata.detail.symbol_name().unwrap_or_default();
        let anchor = format!("{symbol}@L{}", self.start_line);
        self.id = ChunkId::derive(self.kind(), &self.source_path, &anchor);
    }

    #[must_use]
    pub const fn kind(&self) -> ChunkKind {
        self.metadata.kind()
    }

    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        self.metadata.detail.symbol_name()
    }

    #[must_use]
    pub const fn importance(&self) -> f32 {
        self.metadata.importance
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}
