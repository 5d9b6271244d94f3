//! Whole-artifact token accounting

use serde::Serialize;

use crate::tokenizer::TokenCounter;

/// Token count of the rendered artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputMetrics {
    pub token_count: usize,
    /// Declared destination of the artifact; not read or written here
    pub file_path: String,
}

/// Count tokens across the fully rendered artifact
pub fn calculate_output_metrics(
    output: &str,
    counter: &dyn TokenCounter,
    file_path: &str,
) -> OutputMetrics {
    let start = std::time::Instant::now();
    let token_count = counter.count_tokens(output);
    log::debug!(
        "Counted {} {} tokens for {} ({} chars) in {:?}",
        token_count,
        counter.encoding_name(),
        file_path,
        output.len(),
        start.elapsed()
    );
    OutputMetrics { token_count, file_path: file_path.to_owned() }
}

#[cfg(test)]
#[allow(clippy::str_to_string)]
mod tests {
    use super::*;
    use crate::tokenizer::{Encoding, Tokenizer};

    #[test]
    fn test_output_metrics() {
        let tokenizer = Tokenizer::new(Encoding::O200kBase);
        let metrics = calculate_output_metrics("File: a.py\nprint(1)\n", &tokenizer, "out.txt");

        assert!(metrics.token_count > 0);
        assert_eq!(metrics.file_path, "out.txt");
    }

    #[test]
    fn test_empty_output() {
        let tokenizer = Tokenizer::new(Encoding::Cl100kBase);
        assert_eq!(calculate_output_metrics("", &tokenizer, "out.txt").token_count, 0);
    }
}
