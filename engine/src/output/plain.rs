//! Plain text output with `=` rules as delimiters
//!
//! Every structural line in the document is the same rule: a run of `=`
//! longer than any run of `=` appearing in the file contents, the header
//! text or the tree. A line equal to the rule therefore never comes from
//! user content.

use std::fmt::Write;

use crate::output::{
    longest_run, OutputGeneratorContext, StyleGenerator, GENERATOR_NAME, NOTES, PREAMBLE, PURPOSE,
    USAGE_GUIDELINES,
};

/// Minimum rule width
const MIN_RULE_WIDTH: usize = 64;

/// Title of the section holding the files
pub(crate) const FILES_TITLE: &str = "Files";
/// Title of the closing marker
pub(crate) const END_TITLE: &str = "End of Codebase";
/// Label prefix for a file path
pub(crate) const FILE_LABEL: &str = "File: ";

/// Plain text formatter (simple, no markup)
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStyle;

impl PlainStyle {
    /// The rule used to delimit this document
    fn rule(ctx: &OutputGeneratorContext<'_>) -> String {
        let longest = ctx
            .processed_files
            .iter()
            .map(|f| longest_run(&f.content, '='))
            .chain(std::iter::once(longest_run(&ctx.tree_string, '=')))
            .chain(ctx.header_text().map(|h| longest_run(h, '=')))
            .max()
            .unwrap_or(0);
        "=".repeat(MIN_RULE_WIDTH.max(longest + 1))
    }

    fn write_heading(output: &mut String, rule: &str, title: &str) {
        writeln!(output, "{rule}\n{title}\n{rule}").unwrap();
    }

    fn write_summary(output: &mut String, rule: &str) {
        Self::write_heading(output, rule, "File Summary");
        output.push('\n');

        writeln!(output, "Purpose:\n--------\n{PURPOSE}\n").unwrap();

        output.push_str("File Format:\n------------\n");
        output.push_str("The content is organized as follows:\n");
        output.push_str("1. This summary section\n");
        output.push_str("2. User provided header (if any)\n");
        output.push_str("3. Directory structure\n");
        output.push_str("4. Multiple file entries, each consisting of:\n");
        writeln!(output, "  a. A separator line of {} \"=\" characters", rule.len()).unwrap();
        output.push_str("  b. The file path (File: path/to/file)\n");
        output.push_str("  c. The same separator line\n");
        output.push_str("  d. The full contents of the file, followed by one empty line\n\n");

        output.push_str("Usage Guidelines:\n-----------------\n");
        for line in USAGE_GUIDELINES {
            writeln!(output, "- {line}").unwrap();
        }
        output.push('\n');

        output.push_str("Notes:\n------\n");
        for line in NOTES {
            writeln!(output, "- {line}").unwrap();
        }
        output.push('\n');
    }
}

impl StyleGenerator for PlainStyle {
    fn generate(&self, ctx: &OutputGeneratorContext<'_>) -> String {
        let rule = Self::rule(ctx);
        let mut output = String::new();

        Self::write_heading(&mut output, &rule, &format!("{GENERATOR_NAME} output"));
        writeln!(output, "{PREAMBLE}").unwrap();
        writeln!(output, "Generated by {GENERATOR_NAME} on: {}\n", ctx.generation_date).unwrap();

        Self::write_summary(&mut output, &rule);

        if let Some(header) = ctx.header_text() {
            Self::write_heading(&mut output, &rule, "User Provided Header");
            output.push_str(header);
            output.push_str("\n\n");
        }

        Self::write_heading(&mut output, &rule, "Directory Structure");
        output.push_str(&ctx.tree_string);
        output.push('\n');

        Self::write_heading(&mut output, &rule, FILES_TITLE);
        output.push('\n');

        for file in ctx.processed_files {
            Self::write_heading(&mut output, &rule, &format!("{FILE_LABEL}{}", file.path));
            output.push_str(&file.content);
            output.push_str("\n\n");
        }

        Self::write_heading(&mut output, &rule, END_TITLE);
        output
    }
}
