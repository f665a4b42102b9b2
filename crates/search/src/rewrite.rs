use codeqa_provider::{Capabilities, GenerateOptions, Message, TokenUsage};
use serde::Serialize;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You rewrite questions about a codebase for retrieval. \
Reply with exactly two lines and nothing else:\n\
DENSE: <the question restated as one precise sentence>\n\
SPARSE: <space-separated identifiers and keywords likely to appear in the code>";

const REWRITE_MAX_TOKENS: u32 = 256;

/// Outcome of the optional query rewrite step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryRewrite {
    /// Separate semantic and keyword forms of the query
    Rewritten { dense: String, sparse: String },
    /// The raw text is used for both forms
    Fallback { raw: String, reason: String },
}

impl QueryRewrite {
    pub fn fallback(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fallback {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Text to embed
    #[must_use]
    pub fn dense_text(&self) -> &str {
        match self {
            Self::Rewritten { dense, .. } => dense,
            Self::Fallback { raw, .. } => raw,
        }
    }

    /// Text for the sparse query vector
    #[must_use]
    pub fn sparse_text(&self) -> &str {
        match self {
            Self::Rewritten { sparse, .. } => sparse,
            Self::Fallback { raw, .. } => raw,
        }
    }

    #[must_use]
    pub const fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten { .. })
    }
}

/// Parse a generator reply of `DENSE:` / `SPARSE:` lines.
///
/// Labels are case-insensitive and may be wrapped in list or emphasis markers; the first
/// occurrence of each wins. A missing or empty form falls back to `raw`.
#[must_use]
pub fn parse_rewrite(raw: &str, reply: &str) -> QueryRewrite {
    let mut dense: Option<String> = None;
    let mut sparse: Option<String> = None;

    for line in reply.lines() {
        let line = line.trim().trim_start_matches(['-', '*', ' ']);
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('*').trim();
        if value.is_empty() {
            continue;
        }
        match label.trim().trim_matches('*').to_ascii_uppercase().as_str() {
            "DENSE" if dense.is_none() => dense = Some(value.to_string()),
            "SPARSE" if sparse.is_none() => sparse = Some(value.to_string()),
            _ => {}
        }
    }

    match (dense, sparse) {
        (Some(dense), Some(sparse)) => QueryRewrite::Rewritten { dense, sparse },
        (None, None) => QueryRewrite::fallback(raw, "reply has no DENSE/SPARSE lines"),
        (None, Some(_)) => QueryRewrite::fallback(raw, "reply has no DENSE line"),
        (Some(_), None) => QueryRewrite::fallback(raw, "reply has no SPARSE line"),
    }
}

pub(crate) fn rewrite_messages(query: &str) -> Vec<Message> {
    vec![Message::system(SYSTEM_PROMPT), Message::user(query)]
}

/// Ask the generator for a rewrite; every failure degrades to the raw query
pub(crate) async fn rewrite_query(
    capabilities: &Capabilities,
    query: &str,
    timeout: Duration,
) -> (QueryRewrite, Option<TokenUsage>) {
    if capabilities.generator().is_none() {
        return (QueryRewrite::fallback(query, "no generator configured"), None);
    }

    let options = GenerateOptions::default()
        .max_tokens(REWRITE_MAX_TOKENS)
        .temperature(0.0);
    match capabilities
        .generate(&rewrite_messages(query), &options, timeout)
        .await
    {
        Ok(generation) => {
            let rewrite = parse_rewrite(query, &generation.text);
            if let QueryRewrite::Fallback { reason, .. } = &rewrite {
                log::warn!("Query rewrite unusable: {reason}");
            }
            (rewrite, Some(generation.usage))
        }
        Err(err) => {
            log::warn!("Query rewrite failed: {err}");
            (QueryRewrite::fallback(query, err.to_string()), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codeqa_provider::{Generation, GenerationProvider, ProviderError};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Scripted(std::result::Result<&'static str, ProviderError>);

    #[async_trait]
    impl GenerationProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _messages: &[Message],
            _options: &GenerateOptions,
        ) -> codeqa_provider::Result<Generation> {
            self.0.clone().map(|text| Generation {
                text: text.to_string(),
                usage: TokenUsage::new(12, 8),
            })
        }
    }

    fn with_generator(reply: std::result::Result<&'static str, ProviderError>) -> Capabilities {
        Capabilities::new().with_generator(Arc::new(Scripted(reply)))
    }

    #[test]
    fn parses_both_forms() {
        let reply = "DENSE: Where is the user login handled?\nSPARSE: login authenticate session";
        assert_eq!(
            parse_rewrite("login?", reply),
            QueryRewrite::Rewritten {
                dense: "Where is the user login handled?".to_string(),
                sparse: "login authenticate session".to_string(),
            }
        );
    }

    #[test]
    fn tolerates_markup_and_case() {
        let reply = "Sure!\n- **dense:** find login\n* Sparse: login auth\nSPARSE: ignored";
        let rewrite = parse_rewrite("q", reply);
        assert_eq!(rewrite.dense_text(), "find login");
        assert_eq!(rewrite.sparse_text(), "login auth");
    }

    #[test]
    fn incomplete_reply_falls_back_to_raw() {
        let rewrite = parse_rewrite("raw query", "DENSE: only one form");
        assert!(!rewrite.is_rewritten());
        assert_eq!(rewrite.dense_text(), "raw query");
        assert_eq!(rewrite.sparse_text(), "raw query");
        assert!(matches!(rewrite, QueryRewrite::Fallback { ref reason, .. } if reason.contains("SPARSE")));

        let rewrite = parse_rewrite("raw query", "SPARSE:   \nnothing useful");
        assert!(matches!(rewrite, QueryRewrite::Fallback { ref reason, .. } if reason.contains("DENSE/SPARSE")));
    }

    #[tokio::test]
    async fn no_generator_means_fallback_without_usage() {
        let (rewrite, usage) =
            rewrite_query(&Capabilities::new(), "where is login", Duration::from_secs(1)).await;
        assert_eq!(rewrite, QueryRewrite::fallback("where is login", "no generator configured"));
        assert_eq!(usage, None);
    }

    #[tokio::test]
    async fn generator_error_falls_back() {
        let caps = with_generator(Err(ProviderError::request("scripted", "overloaded")));
        let (rewrite, usage) = rewrite_query(&caps, "where is login", Duration::from_secs(1)).await;
        assert!(matches!(rewrite, QueryRewrite::Fallback { ref reason, .. } if reason.contains("overloaded")));
        assert_eq!(usage, None);
    }

    #[tokio::test]
    async fn usable_reply_reports_usage() {
        let caps = with_generator(Ok("DENSE: login flow\nSPARSE: login session"));
        let (rewrite, usage) = rewrite_query(&caps, "where is login", Duration::from_secs(1)).await;
        assert!(rewrite.is_rewritten());
        assert_eq!(usage, Some(TokenUsage::new(12, 8)));
    }
}
