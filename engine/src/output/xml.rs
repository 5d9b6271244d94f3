//! XML-tagged output
//!
//! Free-form text (file bodies, the tree, the user header) always goes into
//! CDATA sections, so it is never interpreted as markup. A `]]>` inside such
//! text is split across two adjacent CDATA sections.

use std::fmt::Write;

use crate::output::{
    OutputGeneratorContext, StyleGenerator, GENERATOR_NAME, NOTES, PREAMBLE, PURPOSE,
    USAGE_GUIDELINES,
};

/// XML formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlStyle;

impl XmlStyle {
    fn write_file_summary(&self, output: &mut String) {
        writeln!(output, "<file_summary>").unwrap();
        writeln!(output, "<purpose>\n{}\n</purpose>\n", escape_xml(PURPOSE)).unwrap();

        writeln!(output, "<file_format>").unwrap();
        writeln!(output, "The content is organized as follows:").unwrap();
        writeln!(output, "1. This summary section").unwrap();
        writeln!(output, "2. User provided header (if any)").unwrap();
        writeln!(output, "3. Directory structure").unwrap();
        writeln!(
            output,
            "4. Repository files, each wrapped in a file element whose path attribute holds the \
             file path and whose body holds the full contents as CDATA"
        )
        .unwrap();
        writeln!(output, "</file_format>\n").unwrap();

        writeln!(output, "<usage_guidelines>").unwrap();
        for line in USAGE_GUIDELINES {
            writeln!(output, "- {}", escape_xml(line)).unwrap();
        }
        writeln!(output, "</usage_guidelines>\n").unwrap();

        writeln!(output, "<notes>").unwrap();
        for line in NOTES {
            writeln!(output, "- {}", escape_xml(line)).unwrap();
        }
        writeln!(output, "</notes>").unwrap();
        writeln!(output, "</file_summary>").unwrap();
    }
}

impl StyleGenerator for XmlStyle {
    fn generate(&self, ctx: &OutputGeneratorContext<'_>) -> String {
        let mut output = String::new();

        writeln!(output, "{PREAMBLE}").unwrap();
        writeln!(
            output,
            "Generated by {GENERATOR_NAME} on: {}\n",
            escape_xml(&ctx.generation_date)
        )
        .unwrap();

        self.write_file_summary(&mut output);
        output.push('\n');

        if let Some(header) = ctx.header_text() {
            writeln!(output, "<user_provided_header>{}</user_provided_header>\n", cdata(header))
                .unwrap();
        }

        writeln!(
            output,
            "<directory_structure>{}</directory_structure>\n",
            cdata(&format!("\n{}", ctx.tree_string))
        )
        .unwrap();

        writeln!(output, "<files>").unwrap();
        writeln!(output, "This section contains the contents of the repository's files.\n")
            .unwrap();
        for file in ctx.processed_files {
            writeln!(
                output,
                "<file path=\"{}\">{}</file>\n",
                escape_xml(&file.path),
                cdata(&file.content)
            )
            .unwrap();
        }
        writeln!(output, "</files>").unwrap();

        output
    }
}

/// Wrap text in CDATA, splitting any embedded terminator
pub(crate) fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Escape XML special characters
pub(crate) fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }

    result
}

/// Reverse of [`escape_xml`]
pub(crate) fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
