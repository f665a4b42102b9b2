use codeqa_indexer::IndexReport;
use codeqa_search::{QueryIntent, QueryResponse, QueryRewrite, RankedChunk};
use std::fmt::Write as _;
use std::path::Path;

const EXPLANATION_WIDTH: usize = 160;

pub fn render_index_report(project_root: &Path, report: &IndexReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Indexed {}", project_root.display());
    let _ = writeln!(
        out,
        "  {} files, {} in {}ms",
        report.files,
        report.summary(),
        report.elapsed_ms
    );
    if !report.chunks_by_kind.is_empty() {
        let kinds: Vec<String> = report
            .chunks_by_kind
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        let _ = writeln!(out, "  chunks: {}", kinds.join(", "));
    }
    if report.oversized_dropped > 0 {
        let _ = writeln!(
            out,
            "  {} oversized declarations covered by block chunks",
            report.oversized_dropped
        );
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }
    out
}

pub fn render_intent(intent: &QueryIntent) -> String {
    let params = &intent.parameters;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "intent: {} (confidence {:.2})",
        intent.intent, intent.confidence
    );
    let _ = writeln!(
        out,
        "scope: {}, complexity: {} (up to {} results)",
        params.scope,
        params.complexity,
        params.complexity.result_cap()
    );
    for (label, values) in [
        ("keywords", &params.keywords),
        ("frameworks", &params.frameworks),
        ("file types", &params.file_types),
        ("components", &params.components),
    ] {
        if !values.is_empty() {
            let _ = writeln!(out, "{label}: {}", values.join(", "));
        }
    }
    out
}

pub fn render_query_response(response: &QueryResponse) -> String {
    let mut out = render_intent(&response.intent);
    match &response.rewrite {
        QueryRewrite::Rewritten { dense, sparse } => {
            let _ = writeln!(out, "rewrite: {dense} | {sparse}");
        }
        QueryRewrite::Fallback { reason, .. } => {
            let _ = writeln!(out, "rewrite: raw query ({reason})");
        }
    }
    if let Some(usage) = response.usage {
        let _ = writeln!(out, "tokens: {}", usage.total());
    }
    out.push('\n');

    if response.ranked.is_empty() {
        out.push_str("No relevant chunks.\n");
    }
    for (rank, hit) in response.ranked.iter().enumerate() {
        render_hit(&mut out, rank + 1, hit);
    }
    for warning in &response.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

fn render_hit(out: &mut String, rank: usize, hit: &RankedChunk) {
    let chunk = &hit.chunk;
    let label = chunk.symbol_name().map_or_else(
        || chunk.kind().to_string(),
        |symbol| format!("{} {symbol}", chunk.kind()),
    );
    let _ = writeln!(
        out,
        "{rank:>2}. {}:{}-{}  {label}  score {:.2}  [{}]",
        chunk.source_path, chunk.start_line, chunk.end_line, hit.score, hit.context_type
    );
    let _ = writeln!(out, "    {}", truncate_one_line(&hit.explanation, EXPLANATION_WIDTH));
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_first_line() {
        assert_eq!(truncate_one_line("short\nsecond", 10), "short");
        assert_eq!(truncate_one_line("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn index_report_lists_warnings() {
        let report = IndexReport {
            files: 2,
            total_chunks: 5,
            embedded: 4,
            provider_errors: 1,
            warnings: vec!["embedding src/a.rs:1: timed out".to_string()],
            ..IndexReport::default()
        };
        let text = render_index_report(Path::new("/repo"), &report);
        assert!(text.contains("2 files, indexed 4/5 chunks, 1 embedding failures"));
        assert!(text.contains("warning: embedding src/a.rs:1: timed out"));
    }
}
