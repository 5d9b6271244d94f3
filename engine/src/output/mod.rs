//! Artifact rendering
//!
//! A style identifier selects one of a closed set of strategies. Anything
//! that is not a recognized identifier renders in the plain style; this is
//! a fallback, not an error.

mod markdown;
pub mod parse;
mod plain;
mod xml;

pub use markdown::MarkdownStyle;
pub use parse::{parse_artifact, ParseError};
pub use plain::PlainStyle;
pub use xml::XmlStyle;

use chrono::{SecondsFormat, Utc};

use crate::config::Config;
use crate::tree::generate_tree_string;
use crate::types::ProcessedFile;

/// Name used in artifact preambles
pub const GENERATOR_NAME: &str = "ctxpack";

/// Rendering strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputStyle {
    /// Tagged document, file bodies in CDATA
    Xml,
    /// Delimited text with `=` rules
    #[default]
    Plain,
    /// Headings plus fenced code blocks
    Markdown,
}

impl OutputStyle {
    /// Map an identifier to a style, falling back to [`OutputStyle::Plain`]
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier {
            "xml" => Self::Xml,
            "plain" => Self::Plain,
            "markdown" => Self::Markdown,
            other => {
                log::debug!("Unrecognized output style {:?}, using plain", other);
                Self::Plain
            },
        }
    }

    /// Canonical identifier
    pub fn name(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Plain => "plain",
            Self::Markdown => "markdown",
        }
    }
}

/// A rendering strategy
pub trait StyleGenerator {
    /// Render the whole artifact; must not depend on anything outside `ctx`
    fn generate(&self, ctx: &OutputGeneratorContext<'_>) -> String;
}

/// Everything a strategy needs to render one artifact
#[derive(Debug, Clone)]
pub struct OutputGeneratorContext<'a> {
    pub generation_date: String,
    pub tree_string: String,
    pub processed_files: &'a [ProcessedFile],
    pub config: &'a Config,
}

impl OutputGeneratorContext<'_> {
    /// Pin the generation timestamp, for reproducible output
    pub fn with_generation_date(mut self, date: impl Into<String>) -> Self {
        self.generation_date = date.into();
        self
    }

    /// User header text, if configured and non-blank
    pub(crate) fn header_text(&self) -> Option<&str> {
        self.config
            .output
            .header_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Build a context stamped with the current time
pub fn build_output_generator_context<'a, S: AsRef<str>>(
    config: &'a Config,
    all_file_paths: &[S],
    processed_files: &'a [ProcessedFile],
) -> OutputGeneratorContext<'a> {
    OutputGeneratorContext {
        generation_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        tree_string: generate_tree_string(all_file_paths),
        processed_files,
        config,
    }
}

/// Render with the strategy selected by `config.output.style`
pub fn render(ctx: &OutputGeneratorContext<'_>) -> String {
    match ctx.config.output.output_style() {
        OutputStyle::Xml => XmlStyle.generate(ctx),
        OutputStyle::Plain => PlainStyle.generate(ctx),
        OutputStyle::Markdown => MarkdownStyle.generate(ctx),
    }
}

/// Build a context for the given inputs and render it
pub fn generate_output<S: AsRef<str>>(
    config: &Config,
    processed_files: &[ProcessedFile],
    all_file_paths: &[S],
) -> String {
    let ctx = build_output_generator_context(config, all_file_paths, processed_files);
    render(&ctx)
}

pub(crate) const PREAMBLE: &str = "This file is a merged representation of the selected \
files of the source tree, combined into a single document.";

pub(crate) const PURPOSE: &str = "This file contains a packed representation of the selected \
files. It is designed to be easily consumable by AI systems for analysis, code review, or other \
automated processes.";

pub(crate) const USAGE_GUIDELINES: [&str; 3] = [
    "This file should be treated as read-only. Any changes should be made to the original files, \
     not this packed version.",
    "When processing this file, use the file path to distinguish between different files.",
    "This file may contain sensitive information. Handle it with the same level of security as \
     the original source tree.",
];

pub(crate) const NOTES: [&str; 3] = [
    "Some files may have been excluded based on ignore rules.",
    "Binary files are not included in this packed representation.",
    "Files are listed in the order they were selected.",
];

/// Longest run of `ch` anywhere in `text`
pub(crate) fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
#[allow(clippy::str_to_string)]
mod tests {
    use super::*;

    fn files() -> Vec<ProcessedFile> {
        vec![ProcessedFile::new("a.py", "print(1)\n"), ProcessedFile::new("b.py", "x=1")]
    }

    fn render_with_style(style: &str) -> String {
        let mut config = Config::default();
        config.output.style = style.to_string();
        let files = files();
        let paths = ["a.py", "b.py"];
        let ctx = build_output_generator_context(&config, &paths, &files)
            .with_generation_date("2024-01-01T00:00:00.000Z");
        render(&ctx)
    }

    #[test]
    fn test_style_identifiers() {
        assert_eq!(OutputStyle::from_identifier("xml"), OutputStyle::Xml);
        assert_eq!(OutputStyle::from_identifier("plain"), OutputStyle::Plain);
        assert_eq!(OutputStyle::from_identifier("markdown"), OutputStyle::Markdown);
        assert_eq!(OutputStyle::from_identifier("XML"), OutputStyle::Plain);
        assert_eq!(OutputStyle::from_identifier(""), OutputStyle::Plain);
    }

    #[test]
    fn test_unknown_style_matches_plain_exactly() {
        let plain = render_with_style("plain");
        assert_eq!(render_with_style("toon"), plain);
        assert_eq!(render_with_style("json"), plain);
    }

    #[test]
    fn test_each_style_differs() {
        let xml = render_with_style("xml");
        let plain = render_with_style("plain");
        let markdown = render_with_style("markdown");
        assert_ne!(xml, plain);
        assert_ne!(markdown, plain);
        assert_ne!(xml, markdown);
    }

    #[test]
    fn test_every_style_carries_date_and_tree() {
        for style in ["xml", "plain", "markdown"] {
            let output = render_with_style(style);
            assert!(output.contains("2024-01-01T00:00:00.000Z"), "{style}");
            assert!(output.contains("a.py\nb.py\n"), "{style}");
        }
    }

    #[test]
    fn test_rendering_is_reproducible() {
        assert_eq!(render_with_style("xml"), render_with_style("xml"));
    }

    #[test]
    fn test_context_date_is_rfc3339() {
        let config = Config::default();
        let files = files();
        let ctx = build_output_generator_context(&config, &["a.py"], &files);
        assert!(chrono::DateTime::parse_from_rfc3339(&ctx.generation_date).is_ok());
        assert!(ctx.generation_date.ends_with('Z'));
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("", '`'), 0);
        assert_eq!(longest_run("a ``` b `` c", '`'), 3);
        assert_eq!(longest_run("====", '='), 4);
    }
}
