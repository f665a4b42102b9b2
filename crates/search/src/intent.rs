use crate::params::{contains_phrase, extract_parameters, words, QueryParameters};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a query is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentType {
    CodeSearch,
    ArchitectureAnalysis,
    Documentation,
    BugAnalysis,
    SecurityAnalysis,
    PerformanceAnalysis,
    TestingGuidance,
    RefactoringAdvice,
    ClassDiagram,
    SequenceDiagram,
    ArchitectureDiagram,
    General,
}

impl IntentType {
    /// Enumeration order; earlier members win ties
    pub const ALL: [Self; 12] = [
        Self::CodeSearch,
        Self::ArchitectureAnalysis,
        Self::Documentation,
        Self::BugAnalysis,
        Self::SecurityAnalysis,
        Self::PerformanceAnalysis,
        Self::TestingGuidance,
        Self::RefactoringAdvice,
        Self::ClassDiagram,
        Self::SequenceDiagram,
        Self::ArchitectureDiagram,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CodeSearch => "code-search",
            Self::ArchitectureAnalysis => "architecture-analysis",
            Self::Documentation => "documentation",
            Self::BugAnalysis => "bug-analysis",
            Self::SecurityAnalysis => "security-analysis",
            Self::PerformanceAnalysis => "performance-analysis",
            Self::TestingGuidance => "testing-guidance",
            Self::RefactoringAdvice => "refactoring-advice",
            Self::ClassDiagram => "class-diagram",
            Self::SequenceDiagram => "sequence-diagram",
            Self::ArchitectureDiagram => "architecture-diagram",
            Self::General => "general",
        }
    }

    #[must_use]
    pub const fn is_diagram(self) -> bool {
        matches!(
            self,
            Self::ClassDiagram | Self::SequenceDiagram | Self::ArchitectureDiagram
        )
    }

    /// Phrases that signal this intent, matched on word boundaries
    #[must_use]
    pub const fn patterns(self) -> &'static [&'static str] {
        match self {
            Self::CodeSearch => &[
                "find",
                "search",
                "locate",
                "where is",
                "where are",
                "show me",
                "look up",
                "function",
                "method",
                "implementation",
                "implemented",
                "defined",
                "definition",
                "usages",
                "code for",
            ],
            Self::ArchitectureAnalysis => &[
                "architecture",
                "architectural",
                "structure",
                "design",
                "module",
                "modules",
                "components",
                "layer",
                "layers",
                "dependencies",
                "how does",
                "overview",
                "high level",
                "organized",
            ],
            Self::Documentation => &[
                "document",
                "documentation",
                "docs",
                "readme",
                "explain",
                "describe",
                "docstring",
                "comments",
                "write docs",
                "usage guide",
            ],
            Self::BugAnalysis => &[
                "bug",
                "bugs",
                "error",
                "errors",
                "exception",
                "crash",
                "crashes",
                "fails",
                "failing",
                "broken",
                "fix",
                "issue",
                "wrong",
                "debug",
                "stack trace",
                "not working",
            ],
            Self::SecurityAnalysis => &[
                "security",
                "secure",
                "vulnerability",
                "vulnerabilities",
                "injection",
                "xss",
                "csrf",
                "authentication",
                "authorization",
                "password",
                "secrets",
                "encryption",
                "sanitize",
                "sql injection",
            ],
            Self::PerformanceAnalysis => &[
                "performance",
                "slow",
                "faster",
                "optimize",
                "optimization",
                "latency",
                "memory",
                "cpu",
                "bottleneck",
                "caching",
                "throughput",
                "memory leak",
            ],
            Self::TestingGuidance => &[
                "test",
                "tests",
                "testing",
                "unit test",
                "unit tests",
                "integration test",
                "coverage",
                "mock",
                "mocks",
                "test case",
                "test cases",
            ],
            Self::RefactoringAdvice => &[
                "refactor",
                "refactoring",
                "clean up",
                "cleanup",
                "simplify",
                "duplicate",
                "duplication",
                "code smell",
                "rename",
                "restructure",
                "improve",
            ],
            Self::ClassDiagram => &[
                "class diagram",
                "uml",
                "class hierarchy",
                "inheritance",
                "diagram",
                "class",
                "classes",
            ],
            Self::SequenceDiagram => &[
                "sequence diagram",
                "sequence",
                "call flow",
                "interaction",
                "message flow",
                "diagram",
            ],
            Self::ArchitectureDiagram => &[
                "architecture diagram",
                "system diagram",
                "component diagram",
                "deployment diagram",
                "c4",
                "diagram",
            ],
            Self::General => &["help", "tell me", "question"],
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown intent '{s}'"))
    }
}

/// Role of the person asking, used to nudge classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Architect,
    Developer,
    Tester,
    Security,
    Writer,
}

impl UserRole {
    pub const ALL: [Self; 5] = [
        Self::Architect,
        Self::Developer,
        Self::Tester,
        Self::Security,
        Self::Writer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Architect => "architect",
            Self::Developer => "developer",
            Self::Tester => "tester",
            Self::Security => "security",
            Self::Writer => "writer",
        }
    }

    /// Intents this role leans towards
    #[must_use]
    pub const fn preferred_intents(self) -> &'static [IntentType] {
        match self {
            Self::Architect => &[
                IntentType::ArchitectureAnalysis,
                IntentType::ArchitectureDiagram,
            ],
            Self::Developer => &[IntentType::CodeSearch, IntentType::BugAnalysis],
            Self::Tester => &[IntentType::TestingGuidance],
            Self::Security => &[IntentType::SecurityAnalysis],
            Self::Writer => &[IntentType::Documentation],
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown role '{s}' (expected architect, developer, tester, security or writer)")
            })
    }
}

/// Conversation state that shifts classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_role: Option<UserRole>,
    pub previous_intent: Option<IntentType>,
}

impl SessionContext {
    #[must_use]
    pub const fn with_role(mut self, role: UserRole) -> Self {
        self.user_role = Some(role);
        self
    }

    #[must_use]
    pub const fn with_previous_intent(mut self, intent: IntentType) -> Self {
        self.previous_intent = Some(intent);
        self
    }
}

/// Classified query: intent, confidence in `[0, 1]` and extracted parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryIntent {
    pub intent: IntentType,
    pub confidence: f32,
    pub parameters: QueryParameters,
}

const ROLE_BOOST: f32 = 2.0;
const CONTINUITY_BOOST: f32 = 1.5;
const GENERAL_FLOOR: f32 = 1.0;

struct Pattern {
    words: Vec<String>,
    weight: f32,
}

static PATTERNS: Lazy<Vec<(IntentType, Vec<Pattern>)>> = Lazy::new(|| {
    IntentType::ALL
        .into_iter()
        .map(|intent| {
            let patterns = intent
                .patterns()
                .iter()
                .map(|phrase| Pattern {
                    words: words(phrase),
                    weight: pattern_weight(phrase),
                })
                .collect();
            (intent, patterns)
        })
        .collect()
});

/// Specificity weight: `1 + words + chars / 10`, one decimal
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn pattern_weight(phrase: &str) -> f32 {
    let words = phrase.split_whitespace().count() as f32;
    let chars = phrase.chars().count() as f32;
    ((1.0 + words + chars / 10.0) * 10.0).round() / 10.0
}

/// Weighted-pattern intent classifier
pub struct IntentClassifier;

impl IntentClassifier {
    /// Score of every intent in enumeration order, session adjustments included
    #[must_use]
    pub fn scores(query: &str, session: &SessionContext) -> Vec<(IntentType, f32)> {
        let query_words = words(query);

        PATTERNS
            .iter()
            .map(|(intent, patterns)| {
                let mut score: f32 = patterns
                    .iter()
                    .filter(|pattern| contains_phrase(&query_words, &pattern.words))
                    .map(|pattern| pattern.weight)
                    .sum();

                if score > 0.0 {
                    if session
                        .user_role
                        .is_some_and(|role| role.preferred_intents().contains(intent))
                    {
                        score += ROLE_BOOST;
                    }
                    if session.previous_intent == Some(*intent) {
                        score += CONTINUITY_BOOST;
                    }
                }
                if *intent == IntentType::General {
                    score = score.max(GENERAL_FLOOR);
                }
                (*intent, score)
            })
            .collect()
    }

    /// Arg-max intent with `confidence = min(1, score / 10)` plus extracted parameters
    #[must_use]
    pub fn classify(query: &str, session: &SessionContext) -> QueryIntent {
        let mut best = (IntentType::General, 0.0f32);
        for (intent, score) in Self::scores(query, session) {
            if score > best.1 {
                best = (intent, score);
            }
        }
        let (intent, score) = best;
        let confidence = (score / 10.0).min(1.0);
        log::debug!("Classified query as {intent} (score {score:.1}, confidence {confidence:.2})");

        QueryIntent {
            intent,
            confidence,
            parameters: extract_parameters(query, intent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(query: &str) -> QueryIntent {
        IntentClassifier::classify(query, &SessionContext::default())
    }

    #[test]
    fn class_diagram_is_confident() {
        let intent = classify("generate a class diagram");
        assert_eq!(intent.intent, IntentType::ClassDiagram);
        assert!(intent.confidence > 0.8, "confidence {}", intent.confidence);
    }

    #[test]
    fn find_function_is_code_search() {
        assert_eq!(classify("find the login function").intent, IntentType::CodeSearch);
        assert_eq!(classify("Where is the session store defined?").intent, IntentType::CodeSearch);
    }

    #[test]
    fn other_intents() {
        assert_eq!(
            classify("why does the parser crash with an exception").intent,
            IntentType::BugAnalysis
        );
        assert_eq!(
            classify("is the password hashing secure against injection").intent,
            IntentType::SecurityAnalysis
        );
        assert_eq!(
            classify("how should I write unit tests for the cache").intent,
            IntentType::TestingGuidance
        );
        assert_eq!(
            classify("draw a sequence diagram of the login call flow").intent,
            IntentType::SequenceDiagram
        );
    }

    #[test]
    fn unmatched_text_is_general() {
        let intent = classify("hmm");
        assert_eq!(intent.intent, IntentType::General);
        assert!((intent.confidence - 0.1).abs() < 1e-6);
        assert_eq!(classify("").intent, IntentType::General);
    }

    #[test]
    fn patterns_match_on_word_boundaries() {
        // "latest" must not match "test", "classic" must not match "class"
        assert_eq!(classify("latest classic").intent, IntentType::General);
    }

    #[test]
    fn weight_grows_with_specificity() {
        assert!((pattern_weight("find") - 2.4).abs() < 1e-6);
        assert!((pattern_weight("class diagram") - 4.3).abs() < 1e-6);
        assert!(pattern_weight("sql injection") > pattern_weight("injection"));
    }

    #[test]
    fn role_breaks_ambiguity() {
        // "design" (architecture, 2.6) narrowly beats "tests" (testing, 2.5)
        let query = "design of the tests";
        assert_eq!(classify(query).intent, IntentType::ArchitectureAnalysis);

        let tester = SessionContext::default().with_role(UserRole::Tester);
        assert_eq!(
            IntentClassifier::classify(query, &tester).intent,
            IntentType::TestingGuidance
        );
    }

    #[test]
    fn previous_intent_gives_continuity() {
        let query = "design of the tests";
        let session = SessionContext::default().with_previous_intent(IntentType::TestingGuidance);
        assert_eq!(
            IntentClassifier::classify(query, &session).intent,
            IntentType::TestingGuidance
        );
    }

    #[test]
    fn intent_names_roundtrip() {
        for intent in IntentType::ALL {
            assert_eq!(intent.as_str().parse::<IntentType>(), Ok(intent));
        }
        assert_eq!("class_diagram".parse::<IntentType>(), Ok(IntentType::ClassDiagram));
        assert_eq!("Architect".parse::<UserRole>(), Ok(UserRole::Architect));
        assert!("manager".parse::<UserRole>().is_err());
    }
}
