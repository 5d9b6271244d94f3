//! Markdown output
//!
//! Every block of free-form text is fenced with a run of backticks longer
//! than any run inside the block, so a closing fence can never appear in
//! the content itself.

use std::fmt::Write;

use crate::output::{
    longest_run, OutputGeneratorContext, StyleGenerator, GENERATOR_NAME, NOTES, PREAMBLE, PURPOSE,
    USAGE_GUIDELINES,
};
use crate::types::ProcessedFile;

pub(crate) const FILES_HEADING: &str = "# Files";
pub(crate) const FILE_HEADING_PREFIX: &str = "## File: ";

/// Markdown formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownStyle;

impl MarkdownStyle {
    fn write_summary(&self, output: &mut String) {
        writeln!(output, "# File Summary\n").unwrap();
        writeln!(output, "## Purpose\n{PURPOSE}\n").unwrap();

        writeln!(output, "## File Format").unwrap();
        writeln!(output, "The content is organized as follows:").unwrap();
        writeln!(output, "1. This summary section").unwrap();
        writeln!(output, "2. User provided header (if any)").unwrap();
        writeln!(output, "3. Directory structure").unwrap();
        writeln!(
            output,
            "4. Multiple file entries, each consisting of:\n  \
             a. A heading with the file path (## File: path/to/file)\n  \
             b. The full contents of the file in a fenced code block\n"
        )
        .unwrap();

        writeln!(output, "## Usage Guidelines").unwrap();
        for line in USAGE_GUIDELINES {
            writeln!(output, "- {line}").unwrap();
        }
        output.push('\n');

        writeln!(output, "## Notes").unwrap();
        for line in NOTES {
            writeln!(output, "- {line}").unwrap();
        }
        output.push('\n');
    }
}

impl StyleGenerator for MarkdownStyle {
    fn generate(&self, ctx: &OutputGeneratorContext<'_>) -> String {
        let mut output = String::new();

        writeln!(output, "# {GENERATOR_NAME} output\n").unwrap();
        writeln!(output, "{PREAMBLE}").unwrap();
        writeln!(output, "Generated by {GENERATOR_NAME} on: {}\n", ctx.generation_date).unwrap();

        self.write_summary(&mut output);

        if let Some(header) = ctx.header_text() {
            writeln!(output, "# User Provided Header").unwrap();
            write_fenced(&mut output, header, "");
            output.push('\n');
        }

        writeln!(output, "# Directory Structure").unwrap();
        write_fenced(&mut output, &ctx.tree_string, "");
        output.push('\n');

        writeln!(output, "{FILES_HEADING}\n").unwrap();
        for file in ctx.processed_files {
            writeln!(output, "{FILE_HEADING_PREFIX}{}", file.path).unwrap();
            write_fenced(&mut output, &file.content, language_hint(file));
            output.push('\n');
        }

        output
    }
}

/// Fence long enough to enclose `text`
pub(crate) fn fence_for(text: &str) -> String {
    "`".repeat(3.max(longest_run(text, '`') + 1))
}

/// Write `text` inside a fenced block; exactly one newline precedes the closing fence
fn write_fenced(output: &mut String, text: &str, language: &str) {
    let fence = fence_for(text);
    writeln!(output, "{fence}{language}\n{text}\n{fence}").unwrap();
}

/// Info string for a file's code block
fn language_hint(file: &ProcessedFile) -> &'static str {
    match file.extension() {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("js" | "mjs" | "cjs") => "javascript",
        Some("ts") => "typescript",
        Some("tsx") => "tsx",
        Some("go") => "go",
        Some("java") => "java",
        Some("c" | "h") => "c",
        Some("cpp" | "cc" | "hpp") => "cpp",
        Some("cs") => "csharp",
        Some("rb") => "ruby",
        Some("sh" | "bash") => "bash",
        Some("md") => "markdown",
        Some("json") => "json",
        Some("toml") => "toml",
        Some("yaml" | "yml") => "yaml",
        Some("html") => "html",
        Some("css") => "css",
        Some("sql") => "sql",
        _ => "",
    }
}

#[cfg(test)]
#[allow(clippy::str_to_string)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn render(files: &[ProcessedFile]) -> String {
        let config = Config::default();
        let ctx = OutputGeneratorContext {
            generation_date: "2024-01-01T00:00:00.000Z".to_string(),
            tree_string: "main.rs\n".to_string(),
            processed_files: files,
            config: &config,
        };
        MarkdownStyle.generate(&ctx)
    }

    #[test]
    fn test_markdown_output() {
        let output = render(&[ProcessedFile::new("main.rs", "fn main() {}\n")]);

        assert!(output.starts_with("# ctxpack output\n"));
        assert!(output.contains("# Directory Structure\n```\nmain.rs\n\n```\n"));
        assert!(output.contains("## File: main.rs\n```rust\nfn main() {}\n\n```\n"));
    }

    #[test]
    fn test_fence_outgrows_backticks() {
        let content = "Use ```code``` or ````more````";
        let output = render(&[ProcessedFile::new("README", content)]);

        assert!(output.contains(&format!("## File: README\n`````\n{content}\n`````\n")));
    }

    #[test]
    fn test_language_hint() {
        assert_eq!(language_hint(&ProcessedFile::new("a/b.py", "")), "python");
        assert_eq!(language_hint(&ProcessedFile::new("Dockerfile", "")), "");
    }
}
