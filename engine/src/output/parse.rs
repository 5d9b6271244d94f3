//! Reading files back out of a rendered artifact
//!
//! Every style is designed so that the path and content of each file can be
//! recovered exactly. This module is the reference reader for that grammar.

use thiserror::Error;

use crate::output::markdown::{FILES_HEADING, FILE_HEADING_PREFIX};
use crate::output::plain::{END_TITLE, FILES_TITLE, FILE_LABEL};
use crate::output::xml::unescape_xml;
use crate::output::OutputStyle;
use crate::types::ProcessedFile;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Artifact could not be read back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Missing {0} section")]
    MissingSection(&'static str),

    #[error("Unterminated entry for {0}")]
    Unterminated(String),

    #[error("Malformed artifact: {0}")]
    Malformed(String),
}

/// Extract `(path, content)` pairs, in document order
pub fn parse_artifact(text: &str, style: OutputStyle) -> Result<Vec<ProcessedFile>, ParseError> {
    match style {
        OutputStyle::Xml => parse_xml(text),
        OutputStyle::Plain => parse_plain(text),
        OutputStyle::Markdown => parse_markdown(text),
    }
}

/// Start of the first line at or after `from` that is exactly `line`
fn find_line(text: &str, from: usize, line: &str) -> Option<usize> {
    let mut search = from;
    while search <= text.len() {
        let found = search + text[search..].find(line)?;
        let at_line_start = found == 0 || text.as_bytes()[found - 1] == b'\n';
        let end = found + line.len();
        let at_line_end = end == text.len() || text.as_bytes()[end] == b'\n';
        if at_line_start && at_line_end {
            return Some(found);
        }
        search = found + 1;
    }
    None
}

/// Index just past the line starting at `start`, and the line itself
fn read_line(text: &str, start: usize) -> (&str, usize) {
    match text[start..].find('\n') {
        Some(i) => (&text[start..start + i], start + i + 1),
        None => (&text[start..], text.len()),
    }
}

fn parse_plain(text: &str) -> Result<Vec<ProcessedFile>, ParseError> {
    let (rule, _) = read_line(text, 0);
    if rule.is_empty() || !rule.bytes().all(|b| b == b'=') {
        return Err(ParseError::Malformed("document does not start with a rule".to_owned()));
    }

    let mut files = Vec::new();
    let mut in_files = false;
    let mut pos = 0;

    loop {
        let Some(start) = find_line(text, pos, rule) else {
            return Err(if in_files {
                ParseError::MissingSection("end of codebase")
            } else {
                ParseError::MissingSection("files")
            });
        };

        // heading: rule, title, rule
        let (_, title_start) = read_line(text, start);
        let (title, closing) = read_line(text, title_start);
        let (closing_rule, body_start) = read_line(text, closing);
        if closing_rule != rule {
            return Err(ParseError::Malformed(format!("heading {title:?} is not closed")));
        }

        if !in_files {
            in_files = title == FILES_TITLE;
            pos = body_start;
            continue;
        }

        if title == END_TITLE {
            return Ok(files);
        }

        let path = title
            .strip_prefix(FILE_LABEL)
            .ok_or_else(|| ParseError::Malformed(format!("unexpected heading {title:?}")))?;
        let next = find_line(text, body_start, rule)
            .ok_or_else(|| ParseError::Unterminated(path.to_owned()))?;
        let content = text[body_start..next]
            .strip_suffix("\n\n")
            .ok_or_else(|| ParseError::Malformed(format!("missing blank line after {path}")))?;

        files.push(ProcessedFile::new(path, content));
        pos = next;
    }
}

/// Find `needle` at or after `from`, skipping over CDATA sections
fn find_outside_cdata(text: &str, from: usize, needle: &str) -> Option<usize> {
    let mut pos = from;
    loop {
        let hit = pos + text[pos..].find(needle)?;
        match text[pos..].find(CDATA_OPEN).map(|i| pos + i) {
            Some(open) if open < hit => {
                let body = open + CDATA_OPEN.len();
                pos = body + text[body..].find(CDATA_CLOSE)? + CDATA_CLOSE.len();
            },
            _ => return Some(hit),
        }
    }
}

fn parse_xml(text: &str) -> Result<Vec<ProcessedFile>, ParseError> {
    const FILE_OPEN: &str = "<file path=\"";
    const FILE_CLOSE: &str = "</file>";

    let open = find_outside_cdata(text, 0, "<files>").ok_or(ParseError::MissingSection("files"))?;
    let mut pos = open + "<files>".len();
    let mut files = Vec::new();

    loop {
        let close = find_outside_cdata(text, pos, "</files>")
            .ok_or(ParseError::MissingSection("</files>"))?;
        let start = match find_outside_cdata(text, pos, FILE_OPEN) {
            Some(start) if start < close => start,
            _ => return Ok(files),
        };

        let attr_start = start + FILE_OPEN.len();
        let attr_end = attr_start
            + text[attr_start..]
                .find("\">")
                .ok_or_else(|| ParseError::Malformed("unclosed file tag".to_owned()))?;
        let path = unescape_xml(&text[attr_start..attr_end]);

        let mut cursor = attr_end + 2;
        let mut content = String::new();
        loop {
            if !text[cursor..].starts_with(CDATA_OPEN) {
                return Err(ParseError::Malformed(format!("expected CDATA in {path}")));
            }
            let body = cursor + CDATA_OPEN.len();
            let end = body
                + text[body..]
                    .find(CDATA_CLOSE)
                    .ok_or_else(|| ParseError::Unterminated(path.clone()))?;
            content.push_str(&text[body..end]);
            cursor = end + CDATA_CLOSE.len();

            if text[cursor..].starts_with(FILE_CLOSE) {
                cursor += FILE_CLOSE.len();
                break;
            }
        }

        files.push(ProcessedFile::new(path, content));
        pos = cursor;
    }
}

fn parse_markdown(text: &str) -> Result<Vec<ProcessedFile>, ParseError> {
    let mut files = Vec::new();
    let mut in_files = false;
    let mut pending_path: Option<&str> = None;
    let mut pos = 0;

    while pos < text.len() {
        let (line, next) = read_line(text, pos);

        if line.starts_with("```") {
            let fence = &line[..line.bytes().take_while(|b| *b == b'`').count()];
            let close = find_line(text, next, fence).ok_or_else(|| {
                ParseError::Unterminated(pending_path.unwrap_or("fenced block").to_owned())
            })?;
            if let Some(path) = pending_path.take() {
                let content = text[next..close]
                    .strip_suffix('\n')
                    .ok_or_else(|| ParseError::Malformed(format!("bad fence in {path}")))?;
                files.push(ProcessedFile::new(path, content));
            }
            let (_, after) = read_line(text, close);
            pos = after;
            continue;
        }

        if line == FILES_HEADING {
            in_files = true;
        } else if in_files {
            if let Some(path) = line.strip_prefix(FILE_HEADING_PREFIX) {
                pending_path = Some(path);
            }
        }
        pos = next;
    }

    if !in_files {
        return Err(ParseError::MissingSection("files"));
    }
    if let Some(path) = pending_path {
        return Err(ParseError::Unterminated(path.to_owned()));
    }
    Ok(files)
}
