use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::frameworks::detect_framework;
use crate::language::Language;
use crate::scanner::{FileScanner, SourceFile};
use crate::strategy::{estimate_complexity, extractor_for, SyntacticSpan};
use crate::types::{Chunk, ChunkDetail, ChunkKind, ChunkMetadata};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const ENTRY_POINT_STEMS: &[&str] = &["main", "index", "app", "lib", "readme", "server"];

/// Chunks produced for one file
#[derive(Debug, Default)]
pub struct FileChunks {
    pub chunks: Vec<Chunk>,
    /// Syntactic chunks larger than the budget (their text is still covered by blocks)
    pub oversized_dropped: usize,
    /// Extraction problems that did not prevent file/block chunks from being emitted
    pub issues: Vec<ChunkerError>,
}

/// Chunks produced for a whole tree plus per-file failures
#[derive(Debug, Default)]
pub struct TreeChunks {
    pub chunks: Vec<Chunk>,
    pub files: usize,
    pub oversized_dropped: usize,
    pub discovery_errors: Vec<ChunkerError>,
    pub extraction_errors: Vec<ChunkerError>,
}

impl TreeChunks {
    #[must_use]
    pub fn stats(&self) -> ChunkingStats {
        ChunkingStats {
            files: self.files,
            chunks_by_kind: count_by_kind(&self.chunks),
            oversized_dropped: self.oversized_dropped,
            discovery_errors: self.discovery_errors.len(),
            extraction_errors: self.extraction_errors.len(),
        }
    }
}

/// Statistics about a chunking run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkingStats {
    pub files: usize,
    pub chunks_by_kind: BTreeMap<ChunkKind, usize>,
    pub oversized_dropped: usize,
    pub discovery_errors: usize,
    pub extraction_errors: usize,
}

impl ChunkingStats {
    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.chunks_by_kind.values().sum()
    }
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds = self
            .chunks_by_kind
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "Files: {} | Chunks: {} ({kinds}) | Oversized dropped: {} | Errors: {} discovery, {} extraction",
            self.files,
            self.total_chunks(),
            self.oversized_dropped,
            self.discovery_errors,
            self.extraction_errors
        )
    }
}

/// Count chunks per kind
#[must_use]
pub fn count_by_kind(chunks: &[Chunk]) -> BTreeMap<ChunkKind, usize> {
    let mut counts = BTreeMap::new();
    for chunk in chunks {
        *counts.entry(chunk.kind()).or_insert(0) += 1;
    }
    counts
}

/// Main chunker interface for turning files into chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with a validated configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Scan `root` and chunk every eligible file. Per-file failures are collected, never fatal.
    pub fn chunk_tree(&self, root: impl AsRef<Path>) -> TreeChunks {
        let scan = FileScanner::new(root.as_ref(), &self.config).scan();
        let mut out = self.chunk_files(&scan.files);
        let mut discovery_errors = scan.errors;
        discovery_errors.append(&mut out.discovery_errors);
        out.discovery_errors = discovery_errors;
        out
    }

    /// Chunk already-discovered files in order. Per-file failures are collected, never fatal.
    pub fn chunk_files(&self, files: &[SourceFile]) -> TreeChunks {
        let mut out = TreeChunks {
            files: files.len(),
            ..TreeChunks::default()
        };

        for file in files {
            match self.chunk_file(file) {
                Ok(file_chunks) => {
                    out.oversized_dropped += file_chunks.oversized_dropped;
                    for issue in file_chunks.issues {
                        log::warn!("{issue}");
                        out.extraction_errors.push(issue);
                    }
                    out.chunks.extend(file_chunks.chunks);
                }
                Err(err @ ChunkerError::Discovery { .. }) => {
                    log::warn!("{err}");
                    out.discovery_errors.push(err);
                }
                Err(err) => {
                    log::warn!("{err}");
                    out.extraction_errors.push(err);
                }
            }
        }

        log::debug!("{}", out.stats());
        out
    }

    /// Read and chunk one scanned file
    pub fn chunk_file(&self, file: &SourceFile) -> Result<FileChunks> {
        let bytes =
            std::fs::read(&file.path).map_err(|e| ChunkerError::discovery(&file.path, e))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| ChunkerError::extraction(&file.path, "file is not valid UTF-8"))?;
        Ok(self.chunk_source(&file.relative, &content))
    }

    /// Chunk in-memory content stored at `source_path` (root-relative)
    #[must_use]
    pub fn chunk_source(&self, source_path: &str, content: &str) -> FileChunks {
        let mut out = FileChunks::default();
        if content.trim().is_empty() {
            return out;
        }

        let language = Language::from_path(source_path);
        let framework = detect_framework(content);
        let lines: Vec<&str> = content.lines().collect();
        let max = self.config.max_chunk_bytes;

        let mut chunks = if content.len() <= max {
            vec![Chunk::new(
                source_path,
                1,
                lines.len().max(1),
                content.to_string(),
                ChunkMetadata::new(
                    language.as_str(),
                    ChunkDetail::File {
                        bytes: content.len(),
                    },
                ),
            )]
        } else {
            split_blocks(&lines, max)
                .into_iter()
                .enumerate()
                .map(|(ordinal, block)| {
                    Chunk::new(
                        source_path,
                        block.start_line,
                        block.end_line,
                        block.content,
                        ChunkMetadata::new(language.as_str(), ChunkDetail::Block { ordinal }),
                    )
                })
                .collect()
        };

        if self.config.extract_syntactic {
            if let Some(extractor) = extractor_for(language.family()) {
                match extractor.extract(&lines, language) {
                    Ok(spans) => {
                        for span in spans {
                            match syntactic_chunk(source_path, &lines, &span, language, max) {
                                Some(chunk) => chunks.push(chunk),
                                None => {
                                    log::debug!(
                                        "Dropping oversized {} '{}' in {source_path}",
                                        span.kind,
                                        span.symbol
                                    );
                                    out.oversized_dropped += 1;
                                }
                            }
                        }
                    }
                    Err(ChunkerError::Extraction { message, .. }) => {
                        out.issues
                            .push(ChunkerError::extraction(source_path, message));
                    }
                    Err(err) => out.issues.push(err),
                }
            }
        }

        let is_framework = framework.is_some();
        for chunk in &mut chunks {
            let importance = importance_for(&chunk.metadata.detail, source_path, is_framework);
            chunk.metadata = chunk
                .metadata
                .clone()
                .framework(framework)
                .importance(importance);
        }

        out.chunks = dedup_ids(chunks);
        out
    }
}

struct Block {
    start_line: usize,
    end_line: usize,
    content: String,
}

/// Greedy line accumulation up to `max` bytes; over-long lines are hard-split on char boundaries.
fn split_blocks(lines: &[&str], max: usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut buffer = String::new();
    let mut start = 0usize;

    let mut flush = |buffer: &mut String, start: usize, end: usize| {
        if !buffer.trim().is_empty() {
            blocks.push(Block {
                start_line: start,
                end_line: end,
                content: std::mem::take(buffer),
            });
        }
        buffer.clear();
    };

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;

        if line.len() > max {
            if !buffer.is_empty() {
                flush(&mut buffer, start, line_no - 1);
            }
            for piece in split_at_char_boundaries(line, max) {
                let mut piece = piece.to_string();
                flush(&mut piece, line_no, line_no);
            }
            continue;
        }

        let needed = if buffer.is_empty() {
            line.len()
        } else {
            buffer.len() + 1 + line.len()
        };
        if needed > max && !buffer.is_empty() {
            flush(&mut buffer, start, line_no - 1);
        }

        if buffer.is_empty() {
            start = line_no;
        } else {
            buffer.push('\n');
        }
        buffer.push_str(line);
    }

    if !buffer.is_empty() {
        flush(&mut buffer, start, lines.len());
    }

    blocks
}

fn split_at_char_boundaries(line: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        let mut cut = rest.len().min(max);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // Budget smaller than one char: take the whole char rather than loop forever.
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (piece, tail) = rest.split_at(cut);
        pieces.push(piece);
        rest = tail;
    }
    pieces
}

fn syntactic_chunk(
    source_path: &str,
    lines: &[&str],
    span: &SyntacticSpan,
    language: Language,
    max: usize,
) -> Option<Chunk> {
    let end = span.end.min(lines.len().saturating_sub(1));
    let content = lines.get(span.start..=end)?.join("\n");
    if content.len() > max {
        return None;
    }

    let symbol = span.symbol.clone();
    let detail = match span.kind {
        ChunkKind::Class => ChunkDetail::Class {
            symbol,
            complexity: estimate_complexity(&content),
        },
        ChunkKind::Function => ChunkDetail::Function {
            symbol,
            complexity: estimate_complexity(&content),
        },
        ChunkKind::Interface => ChunkDetail::Interface { symbol },
        ChunkKind::File | ChunkKind::Block => return None,
    };

    Some(Chunk::new(
        source_path,
        span.start + 1,
        end + 1,
        content,
        ChunkMetadata::new(language.as_str(), detail),
    ))
}

fn file_stem(source_path: &str) -> String {
    let name = source_path.rsplit('/').next().unwrap_or(source_path);
    name.split('.').next().unwrap_or(name).to_lowercase()
}

/// Entry points: `main`, `index`, `app`, `lib`, `README`, ...
#[must_use]
pub fn is_entry_point(source_path: &str) -> bool {
    ENTRY_POINT_STEMS.contains(&file_stem(source_path).as_str())
}

/// Test files by directory or naming convention
#[must_use]
pub fn is_test_path(source_path: &str) -> bool {
    let lowered = source_path.to_lowercase();
    if lowered
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| matches!(dir, "test" | "tests" | "__tests__" | "spec" | "specs"))
    {
        return true;
    }
    let name = lowered.rsplit('/').next().unwrap_or(&lowered);
    let stem = file_stem(name);
    stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_spec")
        || name.contains(".test.")
        || name.contains(".spec.")
}

/// Importance heuristic clamped to `[0.1, 1.0]`
#[must_use]
pub fn importance_for(detail: &ChunkDetail, source_path: &str, has_framework: bool) -> f32 {
    let mut score = detail.kind().base_importance();
    if is_entry_point(source_path) {
        score += 0.10;
    }
    if is_test_path(source_path) {
        score -= 0.15;
    }
    if has_framework {
        score += 0.05;
    }
    if let Some(complexity) = detail.complexity() {
        #[allow(clippy::cast_precision_loss)]
        let bonus = (complexity.saturating_sub(1) as f32 * 0.01).min(0.10);
        score += bonus;
    }
    score.clamp(0.1, 1.0)
}

/// Two declarations sharing `(kind, path, symbol)` get a position-qualified anchor.
fn dedup_ids(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(chunks.len());
    for mut chunk in chunks {
        if seen.contains(&chunk.id) && chunk.kind().is_syntactic() {
            chunk.anchor_at_position();
        }
        if seen.insert(chunk.id.clone()) {
            out.push(chunk);
        } else {
            log::debug!(
                "Skipping duplicate chunk {} in {}",
                chunk.id,
                chunk.source_path
            );
        }
    }
    out
}
