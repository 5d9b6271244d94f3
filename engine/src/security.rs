//! Security scanning for secrets and sensitive data
//!
//! A [`RuleEngine`] lints one file at a time. [`run_security_check`] runs it
//! over every raw file and keeps the files with at least one finding, in
//! input order. A rule engine failure on one file is recorded as a
//! [`ScanFault`] and the remaining files are still scanned.

use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ConfigError, SecurityConfig};
use crate::types::{ProgressCallback, RawFile};

/// Rule engine failure for a single file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule {rule_id} failed: {message}")]
    RuleFailed { rule_id: String, message: String },

    #[error("content could not be scanned: {0}")]
    Unscannable(String),
}

/// Something that can lint file content for secrets
pub trait RuleEngine: Send + Sync {
    /// Lint one file; findings are in the order the engine produced them
    fn lint(&self, file_path: &str, content: &str) -> Result<Vec<Finding>, RuleError>;
}

/// A single rule hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Identifier of the rule that fired
    pub rule_id: &'static str,
    pub kind: SecretKind,
    pub severity: Severity,
    /// 1-based line number
    pub line: u32,
    /// Human-readable description, with the secret redacted
    pub message: String,
}

/// A file with one or more findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspiciousFileResult {
    pub file_path: String,
    pub messages: Vec<String>,
}

/// A file the rule engine failed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFault {
    pub file_path: String,
    pub message: String,
}

/// Outcome of a security pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityCheckResult {
    pub suspicious_files: Vec<SuspiciousFileResult>,
    pub faults: Vec<ScanFault>,
}

impl SecurityCheckResult {
    /// True when nothing was found and nothing failed
    pub fn is_clean(&self) -> bool {
        self.suspicious_files.is_empty() && self.faults.is_empty()
    }
}

/// Kind of secret detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SecretKind {
    /// API key
    ApiKey,
    /// Access token
    AccessToken,
    /// Private key
    PrivateKey,
    /// Password
    Password,
    /// Database connection string
    ConnectionString,
    /// AWS credentials
    AwsCredential,
    /// GitHub token
    GitHubToken,
    /// Generic secret
    Generic,
}

impl SecretKind {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApiKey => "API Key",
            Self::AccessToken => "Access Token",
            Self::PrivateKey => "Private Key",
            Self::Password => "Password",
            Self::ConnectionString => "Connection String",
            Self::AwsCredential => "AWS Credential",
            Self::GitHubToken => "GitHub Token",
            Self::Generic => "Generic Secret",
        }
    }
}

/// Severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Named collection of rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuleSet {
    /// Vendor tokens, private keys, credentialed URLs, JWTs
    #[default]
    Recommend,
    /// Recommend plus generic key/secret/password assignments
    Strict,
}

impl RuleSet {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recommend => "recommend",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for RuleSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "recommend" => Ok(Self::Recommend),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::UnknownRuleSet(other.to_owned())),
        }
    }
}

struct SecretPattern {
    id: &'static str,
    kind: SecretKind,
    regex: Regex,
    severity: Severity,
}

impl SecretPattern {
    fn new(id: &'static str, kind: SecretKind, severity: Severity, pattern: &str) -> Self {
        // patterns are compile-time constants covered by tests
        let regex = Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {id}: {e}"));
        Self { id, kind, regex, severity }
    }
}

fn recommended_patterns() -> Vec<SecretPattern> {
    vec![
        // AWS
        SecretPattern::new(
            "aws-access-key-id",
            SecretKind::AwsCredential,
            Severity::Critical,
            r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b",
        ),
        SecretPattern::new(
            "aws-secret-access-key",
            SecretKind::AwsCredential,
            Severity::Critical,
            r#"(?i)aws[_-]?secret[_-]?access[_-]?key['"]?\s*[:=]\s*['"]?([A-Za-z0-9/+=]{40})"#,
        ),
        // GitHub
        SecretPattern::new(
            "github-token",
            SecretKind::GitHubToken,
            Severity::Critical,
            r"\bgh[pousr]_[A-Za-z0-9]{36}\b",
        ),
        SecretPattern::new(
            "github-fine-grained-token",
            SecretKind::GitHubToken,
            Severity::Critical,
            r"github_pat_[A-Za-z0-9]{22}_[A-Za-z0-9]{59}",
        ),
        // Private keys
        SecretPattern::new(
            "private-key",
            SecretKind::PrivateKey,
            Severity::Critical,
            r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP |ENCRYPTED )?PRIVATE KEY(?: BLOCK)?-----",
        ),
        // Connection strings with inline credentials
        SecretPattern::new(
            "basic-auth-url",
            SecretKind::ConnectionString,
            Severity::High,
            concat!(
                r"(?i)\b(?:mongodb(?:\+srv)?|postgres(?:ql)?|mysql|redis|amqp|https?)://",
                r"[^\s:/@'\x22]+:[^\s@/'\x22]+@[^\s'\x22]+",
            ),
        ),
        // JWT tokens
        SecretPattern::new(
            "jwt",
            SecretKind::AccessToken,
            Severity::High,
            r"\beyJ[A-Za-z0-9_-]{5,}\.eyJ[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{10,}",
        ),
        // Slack tokens
        SecretPattern::new(
            "slack-token",
            SecretKind::AccessToken,
            Severity::High,
            r"\bxox[baprs]-[0-9]{10,13}-[0-9]{10,13}-[a-zA-Z0-9]{24}\b",
        ),
        SecretPattern::new(
            "slack-webhook",
            SecretKind::AccessToken,
            Severity::High,
            r"https://hooks\.slack\.com/services/T[A-Z0-9]+/B[A-Z0-9]+/[A-Za-z0-9]+",
        ),
        // Stripe keys
        SecretPattern::new(
            "stripe-key",
            SecretKind::ApiKey,
            Severity::Critical,
            r"\b(?:sk|rk)_(?:test|live)_[A-Za-z0-9]{24,}",
        ),
        // OpenAI / Anthropic style keys
        SecretPattern::new(
            "llm-api-key",
            SecretKind::ApiKey,
            Severity::Critical,
            r"\bsk-(?:ant-|proj-)?[A-Za-z0-9_-]{32,}",
        ),
        // npm
        SecretPattern::new(
            "npm-token",
            SecretKind::AccessToken,
            Severity::High,
            r"\bnpm_[A-Za-z0-9]{36}\b",
        ),
    ]
}

fn strict_patterns() -> Vec<SecretPattern> {
    vec![
        // Generic API keys
        SecretPattern::new(
            "generic-api-key",
            SecretKind::ApiKey,
            Severity::High,
            r#"(?i)(?:api[_-]?key|apikey)['"]?\s*[:=]\s*['"]?([A-Za-z0-9_-]{20,})"#,
        ),
        // Generic secrets
        SecretPattern::new(
            "generic-secret",
            SecretKind::Generic,
            Severity::High,
            r#"(?i)(?:secret|token)['"]?\s*[:=]\s*['"]?([A-Za-z0-9_-]{20,})"#,
        ),
        // Passwords
        SecretPattern::new(
            "password-assignment",
            SecretKind::Password,
            Severity::High,
            r#"(?i)passw(?:or)?d['"]?\s*[:=]\s*['"]?([^'"\s]{8,})"#,
        ),
    ]
}

/// Regex-backed rule engine
pub struct RegexRuleEngine {
    rule_set: RuleSet,
    patterns: Vec<SecretPattern>,
    allowlist: Vec<String>,
}

impl Default for RegexRuleEngine {
    fn default() -> Self {
        Self::new(RuleSet::Recommend)
    }
}

impl RegexRuleEngine {
    /// Create an engine for a rule set
    pub fn new(rule_set: RuleSet) -> Self {
        let mut patterns = recommended_patterns();
        if rule_set == RuleSet::Strict {
            patterns.extend(strict_patterns());
        }
        Self { rule_set, patterns, allowlist: Vec::new() }
    }

    /// Create an engine from the security section of the config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config.rule_set.parse()?);
        for entry in &config.allowlist {
            engine.allowlist(entry);
        }
        Ok(engine)
    }

    /// Ignore matches containing `pattern`
    pub fn allowlist(&mut self, pattern: &str) {
        if !pattern.is_empty() {
            self.allowlist.push(pattern.to_owned());
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        self.rule_set
    }

    /// Number of active rules
    pub fn rule_count(&self) -> usize {
        self.patterns.len()
    }
}

impl RuleEngine for RegexRuleEngine {
    fn lint(&self, _file_path: &str, content: &str) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            for pattern in &self.patterns {
                for m in pattern.regex.find_iter(line) {
                    let matched = m.as_str();

                    // Check allowlist
                    if self.allowlist.iter().any(|a| matched.contains(a.as_str())) {
                        continue;
                    }

                    let line_no = (line_num + 1) as u32;
                    findings.push(Finding {
                        rule_id: pattern.id,
                        kind: pattern.kind,
                        severity: pattern.severity,
                        line: line_no,
                        message: format!(
                            "[{}] {} found at line {}: {}",
                            pattern.severity.name(),
                            pattern.kind.name(),
                            line_no,
                            redact(matched)
                        ),
                    });
                }
            }
        }

        Ok(findings)
    }
}

/// Per-file scan state; a file only moves forward out of `NotScanned`
#[derive(Debug)]
enum FileScanState {
    NotScanned,
    Clean,
    Suspicious(Vec<String>),
    Faulted(String),
}

impl FileScanState {
    fn scan(self, engine: &dyn RuleEngine, file: &RawFile) -> Self {
        match self {
            Self::NotScanned => match engine.lint(&file.path, &file.content) {
                Ok(findings) if findings.is_empty() => Self::Clean,
                Ok(findings) => {
                    log::trace!("Found {} issues in {}", findings.len(), file.path);
                    for finding in &findings {
                        log::trace!("  - {}", finding.message);
                    }
                    Self::Suspicious(findings.into_iter().map(|f| f.message).collect())
                },
                Err(e) => {
                    log::warn!("Security check failed for {}: {}", file.path, e);
                    Self::Faulted(e.to_string())
                },
            },
            done => done,
        }
    }
}

/// Scan every raw file and collect the suspicious ones
///
/// Files are linted in parallel; the result preserves input order.
pub fn run_security_check(
    raw_files: &[RawFile],
    engine: &dyn RuleEngine,
    progress: &ProgressCallback<'_>,
) -> SecurityCheckResult {
    progress("Running security check...");

    let states: Vec<FileScanState> = raw_files
        .par_iter()
        .map(|file| FileScanState::NotScanned.scan(engine, file))
        .collect();

    raw_files.iter().zip(states).fold(
        SecurityCheckResult::default(),
        |mut result, (file, state)| {
            match state {
                FileScanState::Suspicious(messages) => {
                    result
                        .suspicious_files
                        .push(SuspiciousFileResult { file_path: file.path.clone(), messages });
                },
                FileScanState::Faulted(message) => {
                    result.faults.push(ScanFault { file_path: file.path.clone(), message });
                },
                FileScanState::Clean | FileScanState::NotScanned => {},
            }
            result
        },
    )
}

/// Get summary of findings
pub fn summarize(result: &SecurityCheckResult) -> String {
    if result.is_clean() {
        return "No suspicious files detected".to_owned();
    }

    let findings: usize = result.suspicious_files.iter().map(|f| f.messages.len()).sum();
    let mut summary = format!(
        "{} suspicious file(s) with {} finding(s)",
        result.suspicious_files.len(),
        findings
    );
    if !result.faults.is_empty() {
        summary.push_str(&format!(", {} file(s) could not be scanned", result.faults.len()));
    }
    summary
}

/// Redact a matched secret for display
fn redact(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let prefix_len = 4.min(chars.len() / 4);
    let suffix_len = 4.min(chars.len() / 4);

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{}{}{}", prefix, "*".repeat(chars.len() - prefix_len - suffix_len), suffix)
}
