//! Size and token metrics for a packed artifact
//!
//! Per-file metrics and whole-artifact token accounting are independent
//! read-only computations; [`calculate_metrics`] runs them side by side with
//! `rayon::join` and folds the results into a [`MetricsSummary`].

mod file_metrics;
mod output_metrics;

pub use file_metrics::{
    calculate_all_file_metrics, calculate_file_metrics, count_lines, FileMetrics,
};
pub use output_metrics::{calculate_output_metrics, OutputMetrics};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{Config, ConfigError};
use crate::tokenizer::{TokenCounter, Tokenizer};
use crate::types::{ProcessedFile, ProgressCallback};

/// Aggregated metrics for one pack run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    pub total_files: usize,
    /// Length of the rendered artifact, headers and tree included
    pub total_characters: usize,
    /// Tokens in the rendered artifact
    pub total_tokens: usize,
    pub total_lines: usize,
    pub file_char_counts: BTreeMap<String, usize>,
    pub file_token_counts: BTreeMap<String, usize>,
    pub file_line_counts: BTreeMap<String, usize>,
}

impl MetricsSummary {
    /// Fold per-file metrics and the artifact measurements into a summary
    ///
    /// `total_files` is the number of processed inputs, and
    /// `total_characters` is measured on the artifact itself, never summed
    /// from the per-file counts.
    pub fn from_parts(
        total_files: usize,
        output: &str,
        file_metrics: &[FileMetrics],
        output_metrics: &OutputMetrics,
    ) -> Self {
        let base = Self {
            total_files,
            total_characters: output.chars().count(),
            total_tokens: output_metrics.token_count,
            ..Self::default()
        };

        file_metrics.iter().fold(base, |mut summary, file| {
            if summary.file_char_counts.contains_key(&file.path) {
                log::warn!("Duplicate path in processed files: {}", file.path);
                // keep totals consistent with the maps
                if let Some(previous) = summary.file_line_counts.get(&file.path) {
                    summary.total_lines -= previous;
                }
            }
            summary.file_char_counts.insert(file.path.clone(), file.char_count);
            summary.file_token_counts.insert(file.path.clone(), file.token_count);
            summary.file_line_counts.insert(file.path.clone(), file.line_count);
            summary.total_lines += file.line_count;
            summary
        })
    }

    /// The `n` largest files by character count, ties broken by path
    pub fn top_files(&self, n: usize) -> Vec<(&str, usize)> {
        let mut files: Vec<(&str, usize)> = self
            .file_char_counts
            .iter()
            .map(|(path, chars)| (path.as_str(), *chars))
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        files.truncate(n);
        files
    }

    /// Token count recorded for a file
    pub fn file_tokens(&self, path: &str) -> Option<usize> {
        self.file_token_counts.get(path).copied()
    }
}

/// Compute per-file and artifact metrics using the configured encoding
///
/// The encoding is resolved before any work starts, so an unknown encoding
/// yields an error and no partial result.
pub fn calculate_metrics(
    processed_files: &[ProcessedFile],
    output: &str,
    progress: &ProgressCallback<'_>,
    config: &Config,
) -> Result<MetricsSummary, ConfigError> {
    let tokenizer = Tokenizer::for_encoding(&config.token_count.encoding)?;
    Ok(calculate_metrics_with(
        processed_files,
        output,
        progress,
        &tokenizer,
        &config.output.file_path,
    ))
}

/// Same as [`calculate_metrics`] with an explicit token counter
pub fn calculate_metrics_with(
    processed_files: &[ProcessedFile],
    output: &str,
    progress: &ProgressCallback<'_>,
    counter: &dyn TokenCounter,
    output_path: &str,
) -> MetricsSummary {
    progress("Calculating metrics...");

    let (file_metrics, output_metrics) = rayon::join(
        || calculate_all_file_metrics(processed_files, counter, progress),
        || calculate_output_metrics(output, counter, output_path),
    );

    MetricsSummary::from_parts(processed_files.len(), output, &file_metrics, &output_metrics)
}
