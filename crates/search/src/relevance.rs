use crate::intent::{IntentType, QueryIntent};
use codeqa_chunker::{is_entry_point, is_test_path, Chunk, ChunkKind, Language};
use codeqa_lexical::tokenize;
use codeqa_vector_store::SearchHit;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

const SYMBOL_MATCH: f32 = 3.0;
const KIND_MATCH: f32 = 2.0;
const PATH_MATCH: f32 = 1.5;
const CONTENT_MATCH: f32 = 1.0;
const FRAMEWORK_MATCH: f32 = 2.0;
const COMPONENT_MATCH: f32 = 1.5;

/// Results at or below this relevance are dropped
pub const MIN_RELEVANCE: f32 = 0.1;

const SECURITY_PATH_HINTS: &[&str] = &["auth", "security", "crypto", "password", "token", "session"];

/// How a ranked chunk relates to the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextType {
    DirectMatch,
    Framework,
    Dependency,
    Pattern,
    Related,
}

impl ContextType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectMatch => "direct-match",
            Self::Framework => "framework",
            Self::Dependency => "dependency",
            Self::Pattern => "pattern",
            Self::Related => "related",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieved chunk re-scored against the classified query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    /// Planner relevance
    pub score: f32,
    /// Score from the hybrid retrieval stage
    pub hybrid_score: f32,
    pub explanation: String,
    pub context_type: ContextType,
}

/// Intent-aware relevance:
/// `(keyword + framework + component matches + intent bonus) × importance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceScorer {
    retrieval_weight: f32,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self {
            retrieval_weight: 1.0,
        }
    }
}

impl RelevanceScorer {
    /// `retrieval_weight` scales the hybrid score inside the intent bonus
    #[must_use]
    pub const fn new(retrieval_weight: f32) -> Self {
        Self { retrieval_weight }
    }

    /// Score hits (given in hybrid order), drop weak ones, sort, keep `limit`
    #[must_use]
    pub fn rank(&self, intent: &QueryIntent, hits: Vec<SearchHit>, limit: usize) -> Vec<RankedChunk> {
        let mut ranked: Vec<(usize, RankedChunk)> = hits
            .into_iter()
            .enumerate()
            .filter_map(|(rank, hit)| self.score(intent, hit).map(|scored| (rank, scored)))
            .collect();

        ranked.sort_by(|a, b| {
            b.1.score
                .total_cmp(&a.1.score)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);
        ranked.into_iter().map(|(_, scored)| scored).collect()
    }

    /// Relevance of one hit; `None` when at or below [`MIN_RELEVANCE`]
    #[must_use]
    pub fn score(&self, intent: &QueryIntent, hit: SearchHit) -> Option<RankedChunk> {
        let chunk = &hit.chunk;
        let params = &intent.parameters;
        let symbol_tokens: HashSet<String> = chunk
            .symbol_name()
            .map(tokenize)
            .unwrap_or_default()
            .into_iter()
            .collect();
        let path_tokens: HashSet<String> = tokenize(&chunk.source_path).into_iter().collect();
        let content_tokens: HashSet<String> = tokenize(&chunk.content).into_iter().collect();

        let mut notes: Vec<String> = Vec::new();
        let mut direct = false;

        let mut keyword_score = 0.0;
        for keyword in &params.keywords {
            let (weight, note) = if symbol_tokens.contains(keyword) {
                direct = true;
                (SYMBOL_MATCH, "symbol")
            } else if names_kind(keyword, chunk.kind()) {
                (KIND_MATCH, "kind")
            } else if path_tokens.contains(keyword) {
                direct = true;
                (PATH_MATCH, "path")
            } else if content_tokens.contains(keyword) {
                (CONTENT_MATCH, "content")
            } else {
                continue;
            };
            keyword_score += weight;
            notes.push(format!("{note} matches '{keyword}'"));
        }

        let mut framework_score = 0.0;
        if let Some(tag) = chunk.metadata.framework.as_deref() {
            if params.frameworks.iter().any(|fw| fw.eq_ignore_ascii_case(tag)) {
                framework_score += FRAMEWORK_MATCH;
                notes.push(format!("uses {tag}"));
            }
        }

        let mut component_score = 0.0;
        for component in &params.components {
            if symbol_tokens.contains(component) || path_tokens.contains(component) {
                component_score += COMPONENT_MATCH;
                notes.push(format!("is a {component}"));
            }
        }

        let affinity = intent_affinity(intent.intent, chunk);
        if affinity > 0.0 {
            notes.push(format!("fits {}", intent.intent));
        }
        let bonus = self.retrieval_weight * hit.score.max(0.0) + affinity;

        let importance = chunk.importance();
        let score = (keyword_score + framework_score + component_score + bonus) * importance;
        if score <= MIN_RELEVANCE {
            return None;
        }

        let context_type = if direct {
            ContextType::DirectMatch
        } else if framework_score > 0.0 {
            ContextType::Framework
        } else if component_score > 0.0 {
            ContextType::Pattern
        } else if imports_keyword(chunk, &params.keywords) {
            ContextType::Dependency
        } else {
            ContextType::Related
        };

        notes.push(format!(
            "hybrid {:.2}, importance {importance:.2}",
            hit.score
        ));
        Some(RankedChunk {
            explanation: notes.join("; "),
            score,
            hybrid_score: hit.score,
            context_type,
            chunk: hit.chunk,
        })
    }
}

/// `class`, `structs`, `methods`, ... name a chunk kind
fn names_kind(keyword: &str, kind: ChunkKind) -> bool {
    let words: &[&str] = match kind {
        ChunkKind::Class => &["class", "classes", "struct", "structs", "enum", "enums", "record"],
        ChunkKind::Function => &["function", "functions", "method", "methods", "fn", "func"],
        ChunkKind::Interface => &["interface", "interfaces", "trait", "traits", "protocol"],
        ChunkKind::File => &["file", "files"],
        ChunkKind::Block => &[],
    };
    words.contains(&keyword)
}

fn intent_affinity(intent: IntentType, chunk: &Chunk) -> f32 {
    let kind = chunk.kind();
    let path = chunk.source_path.to_lowercase();
    match intent {
        IntentType::ClassDiagram => {
            if matches!(kind, ChunkKind::Class | ChunkKind::Interface) {
                1.5
            } else {
                0.0
            }
        }
        IntentType::SequenceDiagram => {
            if kind == ChunkKind::Function {
                1.0
            } else {
                0.0
            }
        }
        IntentType::ArchitectureAnalysis | IntentType::ArchitectureDiagram => {
            if kind == ChunkKind::Interface {
                0.75
            } else if kind == ChunkKind::File || is_entry_point(&path) {
                0.5
            } else {
                0.0
            }
        }
        IntentType::Documentation => {
            if is_documentation(chunk, &path) {
                1.5
            } else {
                0.0
            }
        }
        IntentType::TestingGuidance => {
            if is_test_path(&path) {
                1.5
            } else {
                0.0
            }
        }
        IntentType::CodeSearch => {
            if kind.is_syntactic() {
                0.5
            } else {
                0.0
            }
        }
        IntentType::BugAnalysis | IntentType::PerformanceAnalysis => {
            if kind == ChunkKind::Function {
                0.5
            } else {
                0.0
            }
        }
        IntentType::SecurityAnalysis => {
            if SECURITY_PATH_HINTS.iter().any(|hint| path.contains(hint)) {
                1.0
            } else {
                0.0
            }
        }
        IntentType::RefactoringAdvice => {
            if chunk.metadata.detail.complexity().is_some_and(|c| c >= 5) {
                1.0
            } else {
                0.0
            }
        }
        IntentType::General => 0.0,
    }
}

fn is_documentation(chunk: &Chunk, path: &str) -> bool {
    matches!(chunk.metadata.language.as_str(), "markdown" | "text")
        || path.contains("readme")
        || path.starts_with("docs/")
        || path.contains("/docs/")
}

/// An import/include line of the chunk mentions a keyword
fn imports_keyword(chunk: &Chunk, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let language = Language::from_path(&chunk.source_path);
    chunk
        .content
        .lines()
        .filter(|line| language.is_import_line(line))
        .any(|line| tokenize(line).iter().any(|token| keywords.contains(token)))
}
