//! ctxpack engine - pack a source tree into one document for LLMs
//!
//! This crate turns an ordered set of files into a single artifact and
//! reports on it:
//!
//! - Rendering in xml, plain or markdown style, with a directory tree
//! - Per-file and whole-artifact size metrics with BPE token counts
//! - Secret scanning with pluggable rule engines
//! - Reading artifacts back into their files
//!
//! File discovery, preprocessing and writing the artifact are left to the
//! caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use ctxpack_engine::{pack, Config, PackInputs, PackOptions, RawFile};
//!
//! let inputs = PackInputs::from_raw(vec![RawFile::new("main.py", "print(1)\n")]);
//! let result = pack(&inputs, &Config::default(), &PackOptions::default(), &|_| {})?;
//! println!("{} tokens", result.metrics.total_tokens);
//! ```

pub mod config;
pub mod metrics;
pub mod output;
pub mod pack;
pub mod security;
pub mod tokenizer;
pub mod tree;
pub mod types;

pub use config::{
    Config, ConfigError, OutputConfig, PerformanceConfig, SecurityConfig, TokenCountConfig,
};
pub use metrics::{calculate_metrics, FileMetrics, MetricsSummary, OutputMetrics};
pub use output::{generate_output, parse_artifact, OutputGeneratorContext, OutputStyle};
pub use pack::{pack, PackInputs, PackOptions, PackResult};
pub use security::{
    run_security_check, RegexRuleEngine, RuleEngine, RuleError, RuleSet, SecurityCheckResult,
    SuspiciousFileResult,
};
pub use tokenizer::{Encoding, TokenCounter, Tokenizer};
pub use tree::generate_tree_string;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // Verify version follows semver format (at least has a number)
        assert!(VERSION.chars().any(|c| c.is_ascii_digit()));
    }
}
