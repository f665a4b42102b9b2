//! Heuristic declaration extraction.
//!
//! Each language family gets one [`SyntacticExtractor`]. Both extractors share the per-language
//! declaration patterns and differ only in how they find where a body ends.

use crate::error::{ChunkerError, Result};
use crate::language::{Language, LanguageFamily};
use crate::types::ChunkKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

/// Lines scanned past a declaration while looking for its opening brace
const SIGNATURE_LOOKAHEAD: usize = 8;

/// Lines scanned past a Python declaration while looking for the closing `:` of its header
const HEADER_LOOKAHEAD: usize = 12;

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "do", "switch", "case", "catch", "try", "return",
    "new", "throw", "function", "sizeof", "typeof", "await", "match", "loop", "using", "lock",
    "fixed", "yield", "elif", "when", "super", "this",
];

/// A declaration located in a source file. Lines are 0-indexed and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntacticSpan {
    pub kind: ChunkKind,
    pub symbol: String,
    pub start: usize,
    pub end: usize,
}

/// Strategy that locates class / function / interface declarations and their bodies.
pub trait SyntacticExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extract declaration spans from the lines of one file.
    fn extract(&self, lines: &[&str], language: Language) -> Result<Vec<SyntacticSpan>>;
}

/// Pick the extractor for a language family
#[must_use]
pub fn extractor_for(family: LanguageFamily) -> Option<&'static dyn SyntacticExtractor> {
    static BRACE: BraceDepthExtractor = BraceDepthExtractor;
    static INDENT: IndentationExtractor = IndentationExtractor;
    match family {
        LanguageFamily::Brace => Some(&BRACE),
        LanguageFamily::Indentation => Some(&INDENT),
        LanguageFamily::Plain => None,
    }
}

/// Count of branching/looping keywords plus one
#[must_use]
pub fn estimate_complexity(text: &str) -> u32 {
    static BRANCHES: Lazy<Regex> = Lazy::new(|| {
        compile(
            r"\b(?:if|elif|elsif|for|foreach|while|until|unless|case|catch|except|when|guard|loop|match)\b",
        )
    });
    let count = BRANCHES.find_iter(text).count();
    u32::try_from(count).unwrap_or(u32::MAX).saturating_add(1)
}

struct DeclarationPattern {
    kind: ChunkKind,
    regex: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid declaration pattern {pattern}: {err}"))
}

fn decl(kind: ChunkKind, pattern: &str) -> DeclarationPattern {
    DeclarationPattern {
        kind,
        regex: compile(pattern),
    }
}

static RUST: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Interface,
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?trait\s+(?P<name>[A-Za-z_]\w*)",
        ),
        decl(
            ChunkKind::Class,
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|union)\s+(?P<name>[A-Za-z_]\w*)",
        ),
        decl(
            ChunkKind::Function,
            r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe|extern\s+"[^"]*")\s+)*fn\s+(?P<name>[A-Za-z_]\w*)"#,
        ),
    ]
});

static GO: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Interface,
            r"^\s*type\s+(?P<name>[A-Za-z_]\w*)\s+interface\b",
        ),
        decl(
            ChunkKind::Class,
            r"^\s*type\s+(?P<name>[A-Za-z_]\w*)\s+struct\b",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*func\s+(?:\([^)]*\)\s*)?(?P<name>[A-Za-z_]\w*)",
        ),
    ]
});

static SCRIPT: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Interface,
            r"^\s*(?:export\s+)?(?:declare\s+)?interface\s+(?P<name>[A-Za-z_$][\w$]*)",
        ),
        decl(
            ChunkKind::Class,
            r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>",
        ),
        decl(
            ChunkKind::Function,
            r"^\s+(?:(?:public|private|protected|static|async|readonly|override|get|set)\s+)*(?P<name>[A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::\s*[^{]+)?\{",
        ),
    ]
});

static JVM_LIKE: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Interface,
            r"^\s*(?:(?:public|private|protected|internal|abstract|sealed|static|fun|export)\s+)*(?:interface|protocol|trait)\s+(?P<name>[A-Za-z_]\w*)",
        ),
        decl(
            ChunkKind::Class,
            r"^\s*(?:(?:public|private|protected|internal|abstract|final|sealed|static|partial|data|open|case|inner|enum|readonly)\s+)*(?:class|struct|record|enum|object)\s+(?P<name>[A-Za-z_]\w*)",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*(?:(?:public|private|protected|internal|open|override|static|final|suspend|inline|async|mutating|abstract)\s+)*(?:fun|func|def|function)\s+(?:<[^>]*>\s*)?(?:[A-Za-z_]\w*\.)?(?P<name>[A-Za-z_]\w*)",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|virtual|override|async|synchronized|sealed|extern|unsafe|new)\s+)+[\w<>\[\],.?\s]*?(?P<name>[A-Za-z_]\w*)\s*\([^;]*$",
        ),
    ]
});

static C_LIKE: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Class,
            r"^\s*(?:typedef\s+)?(?:class|struct|union)\s+(?P<name>[A-Za-z_]\w*)[^;]*$",
        ),
        decl(
            ChunkKind::Function,
            r"^[A-Za-z_][\w:<>,*&\s]*?[\s*&]+(?P<name>[A-Za-z_][\w:~]*)\s*\([^;]*$",
        ),
    ]
});

static DART: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Class,
            r"^\s*(?:abstract\s+)?(?:class|mixin|enum)\s+(?P<name>[A-Za-z_]\w*)",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*(?:static\s+)?(?:Future<[^>]*>|[A-Za-z_][\w<>?]*)\s+(?P<name>[A-Za-z_]\w*)\s*\([^;]*$",
        ),
    ]
});

static PYTHON: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Interface,
            r"^\s*class\s+(?P<name>[A-Za-z_]\w*)\s*\([^)]*\b(?:Protocol|ABC|ABCMeta|Interface)\b[^)]*\)",
        ),
        decl(ChunkKind::Class, r"^\s*class\s+(?P<name>[A-Za-z_]\w*)"),
        decl(
            ChunkKind::Function,
            r"^\s*(?:async\s+)?def\s+(?P<name>[A-Za-z_]\w*)",
        ),
    ]
});

static RUBY: Lazy<Vec<DeclarationPattern>> = Lazy::new(|| {
    vec![
        decl(
            ChunkKind::Class,
            r"^\s*(?:class|module)\s+(?P<name>[A-Z][\w:]*)",
        ),
        decl(
            ChunkKind::Function,
            r"^\s*def\s+(?:self\.)?(?P<name>[A-Za-z_]\w*[?!=]?)",
        ),
    ]
});

fn patterns_for(language: Language) -> &'static [DeclarationPattern] {
    match language {
        Language::Rust => &RUST,
        Language::Go => &GO,
        Language::JavaScript | Language::TypeScript => &SCRIPT,
        Language::Java
        | Language::CSharp
        | Language::Kotlin
        | Language::Swift
        | Language::Scala
        | Language::Php => &JVM_LIKE,
        Language::C | Language::Cpp => &C_LIKE,
        Language::Dart => &DART,
        Language::Python => &PYTHON,
        Language::Ruby => &RUBY,
        _ => &[],
    }
}

/// Match a declaration on a single line
fn match_declaration(line: &str, language: Language) -> Option<(ChunkKind, String)> {
    for pattern in patterns_for(language) {
        let Some(caps) = pattern.regex.captures(line) else {
            continue;
        };
        let Some(name) = caps.name("name") else {
            continue;
        };
        let name = name.as_str();
        let bare = name.rsplit("::").next().unwrap_or(name);
        if CONTROL_KEYWORDS.contains(&bare) {
            continue;
        }
        return Some((pattern.kind, name.to_string()));
    }
    None
}

/// Doc comments, attributes and annotations directly above a declaration belong to it.
fn leading_attachments(lines: &[&str], decl_line: usize, language: Language) -> usize {
    let mut start = decl_line;
    while start > 0 {
        let prev = lines[start - 1].trim_start();
        let attached = match language.family() {
            LanguageFamily::Indentation => language == Language::Python && prev.starts_with('@'),
            _ => {
                prev.starts_with("///")
                    || prev.starts_with("/**")
                    || prev.starts_with("* ")
                    || prev == "*/"
                    || prev.starts_with("*/")
                    || prev.starts_with("#[")
                    || (prev.starts_with('@') && !prev.starts_with("@end"))
                    || (prev.starts_with('[') && prev.ends_with(']'))
            }
        };
        if !attached {
            break;
        }
        start -= 1;
    }
    start
}

/// Brace-delimited languages: the body ends where brace depth returns to zero.
pub struct BraceDepthExtractor;

enum BodyScan {
    Found(usize),
    NoBody,
    Unterminated,
}

#[derive(Default)]
struct LexState {
    in_block_comment: bool,
}

impl BraceDepthExtractor {
    fn scan_body(lines: &[&str], decl_line: usize, language: Language) -> BodyScan {
        let mut state = LexState::default();
        let mut depth: i64 = 0;
        let mut opened = false;

        for (idx, line) in lines.iter().enumerate().skip(decl_line) {
            if !opened && idx > decl_line {
                if idx - decl_line > SIGNATURE_LOOKAHEAD
                    || line.trim().is_empty()
                    || match_declaration(line, language).is_some()
                {
                    return BodyScan::NoBody;
                }
            }

            for token in structural_chars(line, language, &mut state) {
                match token {
                    '{' => {
                        depth += 1;
                        opened = true;
                    }
                    '}' => {
                        depth -= 1;
                        if opened && depth == 0 {
                            return BodyScan::Found(idx);
                        }
                        if depth < 0 {
                            return BodyScan::NoBody;
                        }
                    }
                    ';' if !opened && depth == 0 => return BodyScan::NoBody,
                    _ => {}
                }
            }
        }

        if opened {
            BodyScan::Unterminated
        } else {
            BodyScan::NoBody
        }
    }
}

/// Braces and semicolons of a line outside of string literals and comments
fn structural_chars(line: &str, language: Language, state: &mut LexState) -> Vec<char> {
    let chars: Vec<char> = line.chars().collect();
    let comment = language.line_comment().map(|c| c.chars().collect::<Vec<_>>());
    let mut out = Vec::new();
    let mut in_string: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if state.in_block_comment {
            if c == '*' && next == Some('/') {
                state.in_block_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if let Some(quote) = in_string {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        if let Some(marker) = &comment {
            if chars[i..].starts_with(marker) {
                break;
            }
        }

        match c {
            '/' if next == Some('*') => {
                state.in_block_comment = true;
                i += 2;
                continue;
            }
            '"' | '`' => in_string = Some(c),
            '\'' if language.single_quote_strings() => in_string = Some(c),
            '\'' => {
                // Rust char literal ('{' or '\n'); lifetimes fall through untouched.
                if chars.get(i + 2) == Some(&'\'') {
                    i += 3;
                    continue;
                }
                if next == Some('\\') {
                    if let Some(close) = chars[i + 2..].iter().take(8).position(|&ch| ch == '\'') {
                        i += close + 3;
                        continue;
                    }
                }
            }
            '{' | '}' | ';' => out.push(c),
            _ => {}
        }
        i += 1;
    }

    out
}

impl SyntacticExtractor for BraceDepthExtractor {
    fn name(&self) -> &'static str {
        "brace-depth"
    }

    fn extract(&self, lines: &[&str], language: Language) -> Result<Vec<SyntacticSpan>> {
        let mut spans = Vec::new();
        let mut unterminated = 0usize;

        for (idx, line) in lines.iter().enumerate() {
            let Some((kind, symbol)) = match_declaration(line, language) else {
                continue;
            };

            match Self::scan_body(lines, idx, language) {
                BodyScan::Found(end) => spans.push(SyntacticSpan {
                    kind,
                    symbol,
                    start: leading_attachments(lines, idx, language),
                    end,
                }),
                BodyScan::NoBody => {}
                BodyScan::Unterminated => {
                    log::debug!("Unterminated body for {} '{symbol}' at line {}", kind, idx + 1);
                    unterminated += 1;
                }
            }
        }

        if spans.is_empty() && unterminated > 0 {
            return Err(ChunkerError::extraction(
                PathBuf::new(),
                format!("{unterminated} declaration(s) with unbalanced braces"),
            ));
        }

        Ok(spans)
    }
}

/// Indentation-delimited languages: the body ends before the first line indented at or
/// above the declaration's own level.
pub struct IndentationExtractor;

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn strip_hash_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code)
}

impl IndentationExtractor {
    /// Last line of a declaration header (Python signatures may span lines)
    fn header_end(lines: &[&str], decl_line: usize, language: Language) -> Option<usize> {
        if language != Language::Python {
            return Some(decl_line);
        }

        let mut parens: i64 = 0;
        for (idx, line) in lines
            .iter()
            .enumerate()
            .skip(decl_line)
            .take(HEADER_LOOKAHEAD)
        {
            let code = strip_hash_comment(line).trim_end();
            for c in code.chars() {
                match c {
                    '(' | '[' | '{' => parens += 1,
                    ')' | ']' | '}' => parens -= 1,
                    _ => {}
                }
            }
            if parens <= 0 {
                return Some(idx);
            }
        }
        None
    }

    fn is_one_liner(header: &str, language: Language) -> bool {
        let code = strip_hash_comment(header).trim_end();
        match language {
            Language::Python => !code.ends_with(':'),
            Language::Ruby => code.ends_with(" end") || code.contains("; end"),
            _ => false,
        }
    }

    fn body_end(lines: &[&str], decl_line: usize, header_end: usize, language: Language) -> usize {
        let base = indent_width(lines[decl_line]);
        let mut last = header_end;

        for (idx, line) in lines.iter().enumerate().skip(header_end + 1) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = indent_width(line);
            if indent <= base {
                if language == Language::Ruby && indent == base && trimmed.starts_with("end") {
                    last = idx;
                }
                break;
            }
            last = idx;
        }

        last
    }
}

impl SyntacticExtractor for IndentationExtractor {
    fn name(&self) -> &'static str {
        "indentation"
    }

    fn extract(&self, lines: &[&str], language: Language) -> Result<Vec<SyntacticSpan>> {
        let mut spans = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let Some((kind, symbol)) = match_declaration(line, language) else {
                continue;
            };
            let Some(header_end) = Self::header_end(lines, idx, language) else {
                log::debug!("Unterminated header for '{symbol}' at line {}", idx + 1);
                continue;
            };

            let end = if header_end == idx && Self::is_one_liner(line, language) {
                idx
            } else {
                Self::body_end(lines, idx, header_end, language)
            };

            spans.push(SyntacticSpan {
                kind,
                symbol,
                start: leading_attachments(lines, idx, language),
                end,
            });
        }

        Ok(spans)
    }
}
