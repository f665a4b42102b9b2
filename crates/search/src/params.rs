use crate::intent::IntentType;
use codeqa_chunker::{Language, FRAMEWORKS};
use codeqa_lexical::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const MAX_KEYWORDS: usize = 10;

/// Request verbs that carry no retrieval signal
const REQUEST_WORDS: &[&str] = &[
    "find", "show", "search", "locate", "look", "explain", "describe", "generate", "create",
    "draw", "give", "tell", "list", "please", "help", "need", "want", "should", "shall",
];

const COMPONENTS: &[&str] = &[
    "controller",
    "service",
    "repository",
    "entity",
    "model",
    "view",
    "handler",
    "middleware",
    "router",
    "route",
    "component",
    "store",
    "reducer",
    "hook",
    "schema",
    "migration",
    "client",
    "server",
    "api",
    "dto",
    "factory",
    "adapter",
    "provider",
    "util",
    "helper",
    "config",
];

const LANGUAGE_WORDS: &[(&str, Language)] = &[
    ("rust", Language::Rust),
    ("python", Language::Python),
    ("javascript", Language::JavaScript),
    ("typescript", Language::TypeScript),
    ("golang", Language::Go),
    ("java", Language::Java),
    ("kotlin", Language::Kotlin),
    ("ruby", Language::Ruby),
    ("swift", Language::Swift),
    ("php", Language::Php),
    ("scala", Language::Scala),
    ("dart", Language::Dart),
    ("csharp", Language::CSharp),
    ("cpp", Language::Cpp),
    ("sql", Language::Sql),
    ("markdown", Language::Markdown),
    ("html", Language::Html),
    ("css", Language::Css),
    ("json", Language::Json),
    ("yaml", Language::Yaml),
    ("toml", Language::Toml),
];

const FILE_WORDS: &[&str] = &["file", "files"];
const MODULE_WORDS: &[&str] = &[
    "module", "modules", "package", "packages", "crate", "crates", "directory", "folder",
    "namespace",
];
const PROJECT_WORDS: &[&str] = &[
    "project", "codebase", "repo", "system", "entire", "whole", "overall", "everything",
];
const FRAMEWORK_WORDS: &[&str] = &["framework", "frameworks", "library"];
const COMPONENT_WORDS: &[&str] = &["component", "components", "class", "classes"];

/// Breadth of the code a query is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeTier {
    File,
    Component,
    Module,
    Project,
    Framework,
}

impl ScopeTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Component => "component",
            Self::Module => "module",
            Self::Project => "project",
            Self::Framework => "framework",
        }
    }

    const fn default_for(intent: IntentType) -> Self {
        match intent {
            IntentType::CodeSearch
            | IntentType::BugAnalysis
            | IntentType::TestingGuidance
            | IntentType::RefactoringAdvice
            | IntentType::SequenceDiagram => Self::Component,
            IntentType::Documentation
            | IntentType::PerformanceAnalysis
            | IntentType::ClassDiagram => Self::Module,
            IntentType::ArchitectureAnalysis
            | IntentType::SecurityAnalysis
            | IntentType::ArchitectureDiagram
            | IntentType::General => Self::Project,
        }
    }
}

impl fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much material an answer needs; caps the number of ranked results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
    Advanced,
}

impl ComplexityTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::Advanced => "advanced",
        }
    }

    /// Maximum number of ranked results
    #[must_use]
    pub const fn result_cap(self) -> usize {
        match self {
            Self::Simple => 5,
            Self::Moderate => 10,
            Self::Complex => 15,
            Self::Advanced => 20,
        }
    }

    const fn default_for(intent: IntentType) -> Self {
        match intent {
            IntentType::CodeSearch => Self::Simple,
            IntentType::Documentation
            | IntentType::BugAnalysis
            | IntentType::PerformanceAnalysis
            | IntentType::TestingGuidance
            | IntentType::RefactoringAdvice
            | IntentType::SequenceDiagram
            | IntentType::General => Self::Moderate,
            IntentType::ArchitectureAnalysis
            | IntentType::SecurityAnalysis
            | IntentType::ClassDiagram => Self::Complex,
            IntentType::ArchitectureDiagram => Self::Advanced,
        }
    }

    fn from_words(words: &[String]) -> Option<Self> {
        words.iter().find_map(|word| match word.as_str() {
            "simple" | "basic" | "quick" | "brief" | "short" => Some(Self::Simple),
            "moderate" | "normal" => Some(Self::Moderate),
            "detailed" | "deep" | "thorough" | "comprehensive" | "depth" => Some(Self::Complex),
            "advanced" | "exhaustive" | "complete" | "expert" => Some(Self::Advanced),
            _ => None,
        })
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured parameters pulled out of the query text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    /// Up to ten content words, most frequent first
    pub keywords: Vec<String>,
    /// Canonical framework names
    pub frameworks: Vec<String>,
    /// Language names, from file extensions or language words
    pub file_types: Vec<String>,
    /// Architectural component names (singular)
    pub components: Vec<String>,
    pub scope: ScopeTier,
    pub complexity: ComplexityTier,
}

/// Lowercased alphanumeric words
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whole-phrase match on word boundaries
pub(crate) fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && haystack.windows(phrase.len()).any(|window| window == phrase)
}

fn has_any(words: &[String], candidates: &[&str]) -> bool {
    words.iter().any(|w| candidates.contains(&w.as_str()))
}

#[must_use]
pub fn extract_parameters(query: &str, intent: IntentType) -> QueryParameters {
    let query_words = words(query);
    let file_types = file_types(query, &query_words);
    let frameworks = frameworks(&query_words);
    let components = components(&query_words);

    let mentions_path = query
        .split_whitespace()
        .any(|token| is_path_token(token) && !is_framework_spelling(token));
    let scope = if mentions_path || has_any(&query_words, FILE_WORDS) {
        ScopeTier::File
    } else if !frameworks.is_empty() || has_any(&query_words, FRAMEWORK_WORDS) {
        ScopeTier::Framework
    } else if has_any(&query_words, MODULE_WORDS) {
        ScopeTier::Module
    } else if has_any(&query_words, PROJECT_WORDS) {
        ScopeTier::Project
    } else if !components.is_empty() || has_any(&query_words, COMPONENT_WORDS) {
        ScopeTier::Component
    } else {
        ScopeTier::default_for(intent)
    };

    QueryParameters {
        keywords: keywords(query),
        frameworks,
        file_types,
        components,
        scope,
        complexity: ComplexityTier::from_words(&query_words)
            .unwrap_or_else(|| ComplexityTier::default_for(intent)),
    }
}

/// Stop-word-filtered tokens ranked by frequency, then first occurrence
fn keywords(query: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in tokenize(query).into_iter().enumerate() {
        if REQUEST_WORDS.contains(&token.as_str()) {
            continue;
        }
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(token, _)| token)
        .collect()
}

fn frameworks(query_words: &[String]) -> Vec<String> {
    FRAMEWORKS
        .iter()
        .filter(|sig| {
            std::iter::once(sig.name)
                .chain(sig.aliases.iter().copied())
                .any(|spelling| contains_phrase(query_words, &words(spelling)))
        })
        .map(|sig| sig.name.to_string())
        .collect()
}

fn file_types(query: &str, query_words: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |language: Language| {
        let name = language.as_str().to_string();
        if language != Language::Unknown && !out.contains(&name) {
            out.push(name);
        }
    };

    for token in query.split_whitespace() {
        if is_framework_spelling(token) {
            continue;
        }
        if let Some(ext) = file_extension(token) {
            push(Language::from_extension(ext));
        }
    }
    for word in query_words {
        if let Some((_, language)) = LANGUAGE_WORDS.iter().find(|(name, _)| name == word) {
            push(*language);
        }
    }
    out
}

fn components(query_words: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in query_words {
        let singular = singular(word);
        if let Some(component) = COMPONENTS.iter().find(|c| **c == singular) {
            if !out.iter().any(|existing| existing == component) {
                out.push((*component).to_string());
            }
        }
    }
    out
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_string()
    } else {
        word.to_string()
    }
}

fn file_extension(token: &str) -> Option<&str> {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != '/');
    let (_, ext) = token.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 6 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// `next.js` and friends look like file names
fn is_framework_spelling(token: &str) -> bool {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '.');
    FRAMEWORKS.iter().any(|sig| {
        sig.name.eq_ignore_ascii_case(token)
            || sig.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(token))
    })
}

fn is_path_token(token: &str) -> bool {
    token.contains('/')
        || token.contains('\\')
        || file_extension(token).is_some_and(|ext| Language::from_extension(ext) != Language::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_drop_stop_and_request_words() {
        let params = extract_parameters("show me the login handler for the login page", IntentType::CodeSearch);
        assert_eq!(params.keywords, vec!["login", "handler", "page"]);
    }

    #[test]
    fn keywords_are_capped() {
        let query = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        let params = extract_parameters(query, IntentType::General);
        assert_eq!(params.keywords.len(), MAX_KEYWORDS);
        assert_eq!(params.keywords[0], "alpha");
    }

    #[test]
    fn frameworks_components_and_file_types() {
        let params = extract_parameters(
            "how do the Django services talk to repositories in models.py",
            IntentType::ArchitectureAnalysis,
        );
        assert_eq!(params.frameworks, vec!["django"]);
        assert_eq!(params.components, vec!["service", "repository", "model"]);
        assert_eq!(params.file_types, vec!["python"]);
        assert_eq!(params.scope, ScopeTier::File);

        let aliased = extract_parameters("routing in next.js", IntentType::CodeSearch);
        assert_eq!(aliased.frameworks, vec!["nextjs"]);
        assert_eq!(aliased.scope, ScopeTier::Framework);
        assert!(aliased.file_types.is_empty());
    }

    #[test]
    fn scope_and_complexity_default_per_intent() {
        let params = extract_parameters("overview", IntentType::ArchitectureAnalysis);
        assert_eq!(params.scope, ScopeTier::Project);
        assert_eq!(params.complexity, ComplexityTier::Complex);

        let params = extract_parameters("where is parse_config", IntentType::CodeSearch);
        assert_eq!(params.scope, ScopeTier::Component);
        assert_eq!(params.complexity, ComplexityTier::Simple);
        assert_eq!(params.complexity.result_cap(), 5);
    }

    #[test]
    fn explicit_signals_override_defaults() {
        let params = extract_parameters(
            "give a detailed walkthrough of the storage module",
            IntentType::CodeSearch,
        );
        assert_eq!(params.scope, ScopeTier::Module);
        assert_eq!(params.complexity, ComplexityTier::Complex);
        assert_eq!(params.complexity.result_cap(), 15);

        let params = extract_parameters("quick look at the whole codebase", IntentType::General);
        assert_eq!(params.scope, ScopeTier::Project);
        assert_eq!(params.complexity, ComplexityTier::Simple);
    }
}
