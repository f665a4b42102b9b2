use std::path::Path;

/// How a language delimits declaration bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    /// `{ ... }` bodies, found by brace-depth counting
    Brace,
    /// Bodies found by indentation tracking
    Indentation,
    /// No syntactic extraction (docs, config, scripts)
    Plain,
}

/// Language detected from a file path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Php,
    Scala,
    Dart,
    Shell,
    Sql,
    Markdown,
    Html,
    Css,
    Json,
    Yaml,
    Toml,
    Xml,
    Text,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Self::Rust,
            "py" | "pyw" => Self::Python,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "go" => Self::Go,
            "java" => Self::Java,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Self::Cpp,
            "cs" => Self::CSharp,
            "rb" => Self::Ruby,
            "swift" => Self::Swift,
            "kt" | "kts" => Self::Kotlin,
            "php" => Self::Php,
            "scala" | "sc" => Self::Scala,
            "dart" => Self::Dart,
            "sh" | "bash" | "zsh" | "fish" => Self::Shell,
            "sql" => Self::Sql,
            "md" | "mdx" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "css" | "scss" | "less" => Self::Css,
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            "xml" => Self::Xml,
            "txt" | "rst" | "adoc" => Self::Text,
            _ => Self::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }

    /// Get language name as string
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Ruby => "ruby",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Php => "php",
            Self::Scala => "scala",
            Self::Dart => "dart",
            Self::Shell => "shell",
            Self::Sql => "sql",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Css => "css",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Xml => "xml",
            Self::Text => "text",
            Self::Unknown => "unknown",
        }
    }

    pub const fn family(self) -> LanguageFamily {
        match self {
            Self::Rust
            | Self::JavaScript
            | Self::TypeScript
            | Self::Go
            | Self::Java
            | Self::C
            | Self::Cpp
            | Self::CSharp
            | Self::Swift
            | Self::Kotlin
            | Self::Php
            | Self::Scala
            | Self::Dart => LanguageFamily::Brace,
            Self::Python | Self::Ruby => LanguageFamily::Indentation,
            _ => LanguageFamily::Plain,
        }
    }

    /// Line comment marker used to skip comment text while scanning bodies
    pub const fn line_comment(self) -> Option<&'static str> {
        match self {
            Self::Rust
            | Self::JavaScript
            | Self::TypeScript
            | Self::Go
            | Self::Java
            | Self::C
            | Self::Cpp
            | Self::CSharp
            | Self::Swift
            | Self::Kotlin
            | Self::Php
            | Self::Scala
            | Self::Dart => Some("//"),
            Self::Python | Self::Ruby | Self::Shell | Self::Yaml | Self::Toml => Some("#"),
            Self::Sql => Some("--"),
            _ => None,
        }
    }

    /// Rust uses `'` for lifetimes, so it cannot open a string literal there
    pub const fn single_quote_strings(self) -> bool {
        !matches!(self, Self::Rust)
    }

    /// Get import/use statement patterns for this language
    pub fn import_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["use ", "extern crate ", "mod "],
            Self::Python => &["import ", "from "],
            Self::JavaScript | Self::TypeScript => &["import ", "require(", "export * from"],
            Self::Go | Self::Java | Self::Swift | Self::Kotlin | Self::Scala | Self::Dart => {
                &["import "]
            }
            Self::CSharp => &["using "],
            Self::Ruby => &["require ", "require_relative ", "include "],
            Self::Php => &["use ", "require ", "include "],
            Self::C | Self::Cpp => &["#include "],
            _ => &[],
        }
    }

    /// Check whether a line is an import statement in this language
    pub fn is_import_line(self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.import_patterns()
            .iter()
            .any(|pattern| trimmed.starts_with(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("RS"), Language::Rust);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("txt"), Language::Text);
        assert_eq!(Language::from_extension("zzz"), Language::Unknown);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("src/main.py"), Language::Python);
        assert_eq!(Language::from_path("index.ts"), Language::TypeScript);
        assert_eq!(Language::from_path("no_extension"), Language::Unknown);
    }

    #[test]
    fn test_families() {
        assert_eq!(Language::Rust.family(), LanguageFamily::Brace);
        assert_eq!(Language::Go.family(), LanguageFamily::Brace);
        assert_eq!(Language::Python.family(), LanguageFamily::Indentation);
        assert_eq!(Language::Ruby.family(), LanguageFamily::Indentation);
        assert_eq!(Language::Markdown.family(), LanguageFamily::Plain);
        assert_eq!(Language::Unknown.family(), LanguageFamily::Plain);
    }

    #[test]
    fn test_import_lines() {
        assert!(Language::Rust.is_import_line("use std::collections::HashMap;"));
        assert!(Language::Python.is_import_line("    from os import path"));
        assert!(Language::TypeScript.is_import_line("import { Router } from 'express';"));
        assert!(!Language::Java.is_import_line("public class Foo {"));
    }
}
