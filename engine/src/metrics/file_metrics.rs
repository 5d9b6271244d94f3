//! Per-file size metrics

use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::tokenizer::TokenCounter;
use crate::types::{ProcessedFile, ProgressCallback};

/// Size metrics for one processed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetrics {
    pub path: String,
    /// Unicode scalar values in the content
    pub char_count: usize,
    pub token_count: usize,
    pub line_count: usize,
}

/// Count lines: every `\n` ends a line, and a trailing partial line counts too
///
/// `""` has 0 lines, `"a\nb"` and `"a\nb\n"` both have 2.
pub fn count_lines(content: &str) -> usize {
    let breaks = content.bytes().filter(|b| *b == b'\n').count();
    if !content.is_empty() && !content.ends_with('\n') {
        breaks + 1
    } else {
        breaks
    }
}

/// Measure one file
pub fn calculate_file_metrics(file: &ProcessedFile, counter: &dyn TokenCounter) -> FileMetrics {
    FileMetrics {
        path: file.path.clone(),
        char_count: file.content.chars().count(),
        token_count: counter.count_tokens(&file.content),
        line_count: count_lines(&file.content),
    }
}

/// Measure every file in parallel
///
/// The result is in input order. Work is spread over the current rayon pool,
/// so concurrency is bounded by the pool size rather than the file count.
pub fn calculate_all_file_metrics(
    files: &[ProcessedFile],
    counter: &dyn TokenCounter,
    progress: &ProgressCallback<'_>,
) -> Vec<FileMetrics> {
    let total = files.len();
    let completed = AtomicUsize::new(0);

    files
        .par_iter()
        .map(|file| {
            let metrics = calculate_file_metrics(file, counter);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(&format!("Calculating metrics... ({}/{}) {}", done, total, file.path));
            metrics
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::str_to_string)]
mod tests {
    use super::*;
    use crate::types::no_progress;
    use std::sync::Mutex;

    /// One token per whitespace-separated word
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }

        fn encoding_name(&self) -> &str {
            "words"
        }
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\nb\n"), 2);
        assert_eq!(count_lines("\n"), 1);
        assert_eq!(count_lines("\n\n"), 2);
        assert_eq!(count_lines("a\r\nb\r\n"), 2);
    }

    #[test]
    fn test_char_count_is_unicode_aware() {
        let file = ProcessedFile::new("greet.txt", "héllo → wörld");
        let metrics = calculate_file_metrics(&file, &WordCounter);
        assert_eq!(metrics.char_count, 13);
        assert_eq!(metrics.token_count, 3);
        assert_eq!(metrics.line_count, 1);
    }

    #[test]
    fn test_all_file_metrics_preserve_order() {
        let files: Vec<ProcessedFile> = (0..200)
            .map(|i| ProcessedFile::new(format!("src/f{i}.rs"), "x ".repeat(i)))
            .collect();

        let metrics = calculate_all_file_metrics(&files, &WordCounter, &no_progress);

        assert_eq!(metrics.len(), files.len());
        for (i, (m, f)) in metrics.iter().zip(&files).enumerate() {
            assert_eq!(m.path, f.path);
            assert_eq!(m.token_count, i);
        }
    }

    #[test]
    fn test_progress_reports_every_file() {
        let files =
            vec![ProcessedFile::new("a.py", "print(1)\n"), ProcessedFile::new("b.py", "x=1")];
        let messages = Mutex::new(Vec::new());
        let record = |msg: &str| messages.lock().unwrap().push(msg.to_string());

        calculate_all_file_metrics(&files, &WordCounter, &record);

        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.starts_with("Calculating metrics... (")));
        assert!(messages.iter().any(|m| m.ends_with("a.py")));
        assert!(messages.iter().any(|m| m.ends_with("/2) b.py")));
    }
}
