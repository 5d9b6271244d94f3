//! The pack pipeline
//!
//! Rendering comes first, then metrics over the processed files and the
//! rendered artifact, then the optional security pass over the raw files.
//! Only configuration errors are fatal; security findings and faults are
//! reported alongside the artifact and never withhold it.

use std::time::Instant;

use crate::config::{Config, ConfigError};
use crate::metrics::{calculate_metrics_with, MetricsSummary};
use crate::output::{build_output_generator_context, render};
use crate::security::{run_security_check, RegexRuleEngine, RuleEngine, SecurityCheckResult};
use crate::tokenizer::Tokenizer;
use crate::types::{ProcessedFile, ProgressCallback, RawFile};

/// Everything discovery and preprocessing hand over
#[derive(Debug, Clone, Default)]
pub struct PackInputs {
    /// Files as read, for the security pass
    pub raw_files: Vec<RawFile>,
    /// Files as rendered and measured
    pub processed_files: Vec<ProcessedFile>,
    /// Every included path, for the tree
    pub all_file_paths: Vec<String>,
}

impl PackInputs {
    /// Inputs where preprocessing left every file untouched
    pub fn from_raw(raw_files: Vec<RawFile>) -> Self {
        let processed_files = raw_files.iter().cloned().map(ProcessedFile::from).collect();
        let all_file_paths = raw_files.iter().map(|f| f.path.clone()).collect();
        Self { raw_files, processed_files, all_file_paths }
    }
}

/// Result of one pack run
#[derive(Debug, Clone)]
pub struct PackResult {
    /// The rendered artifact
    pub output: String,
    pub metrics: MetricsSummary,
    /// `None` when the security check is disabled
    pub security: Option<SecurityCheckResult>,
}

/// Options that do not come from the config file
#[derive(Default)]
pub struct PackOptions<'a> {
    /// Overrides the rule engine built from `config.security`
    pub rule_engine: Option<&'a dyn RuleEngine>,
    /// Pins the generation timestamp
    pub generation_date: Option<String>,
}

/// Render, measure and scan `inputs` according to `config`
pub fn pack(
    inputs: &PackInputs,
    config: &Config,
    options: &PackOptions<'_>,
    progress: &ProgressCallback<'_>,
) -> Result<PackResult, ConfigError> {
    // resolve everything that can fail before doing any work
    let tokenizer = Tokenizer::for_encoding(&config.token_count.encoding)?;
    log::debug!("Counting tokens with {}", tokenizer.encoding());
    let configured_engine = match (options.rule_engine, config.security.enable_security_check) {
        (None, true) => Some(RegexRuleEngine::from_config(&config.security)?),
        _ => None,
    };
    if let Some(engine) = &configured_engine {
        log::debug!(
            "Security rule set {} with {} rules",
            engine.rule_set().name(),
            engine.rule_count()
        );
    }
    let engine: Option<&dyn RuleEngine> = if config.security.enable_security_check {
        let configured = configured_engine.as_ref().map(|e| -> &dyn RuleEngine { e });
        options.rule_engine.or(configured)
    } else {
        None
    };
    let pool = match config.performance.threads {
        Some(threads) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ConfigError::ThreadPool(e.to_string()))?,
        ),
        None => None,
    };

    let run = || {
        let start = Instant::now();

        progress("Generating output...");
        let mut ctx = build_output_generator_context(
            config,
            &inputs.all_file_paths,
            &inputs.processed_files,
        );
        if let Some(date) = &options.generation_date {
            ctx = ctx.with_generation_date(date.clone());
        }
        let output = render(&ctx);
        log::debug!("Rendered {} bytes in {:?}", output.len(), start.elapsed());

        let metrics = calculate_metrics_with(
            &inputs.processed_files,
            &output,
            progress,
            &tokenizer,
            &config.output.file_path,
        );
        log::debug!("Metrics done after {:?}", start.elapsed());

        let security = engine.map(|engine| run_security_check(&inputs.raw_files, engine, progress));

        log::info!(
            "Packed {} files ({} tokens) in {:?}",
            metrics.total_files,
            metrics.total_tokens,
            start.elapsed()
        );
        PackResult { output, metrics, security }
    };

    Ok(match pool {
        Some(pool) => pool.install(run),
        None => run(),
    })
}
