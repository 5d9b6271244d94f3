//! Accurate token counting using BPE tokenizers
//!
//! Encodings are resolved by identifier (`o200k_base`, `cl100k_base`, ...).
//! An identifier that does not name a supported encoding is a configuration
//! error: there is no silent fallback to another encoding or to estimation.

use std::str::FromStr;
use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base, CoreBPE};

use crate::config::ConfigError;

/// Anything that can turn text into a token count
pub trait TokenCounter: Send + Sync {
    /// Count tokens in `text`; empty text has zero tokens
    fn count_tokens(&self, text: &str) -> usize;

    /// Identifier of the encoding this counter implements
    fn encoding_name(&self) -> &str;
}

/// Supported BPE encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// GPT-4o family
    O200kBase,
    /// GPT-4 / GPT-3.5 Turbo
    Cl100kBase,
    /// Codex models
    P50kBase,
    /// Edit models
    P50kEdit,
    /// GPT-3 models; also known as `gpt2`
    R50kBase,
}

impl Encoding {
    /// All supported encodings
    pub const ALL: [Encoding; 5] =
        [Self::O200kBase, Self::Cl100kBase, Self::P50kBase, Self::P50kEdit, Self::R50kBase];

    /// Canonical identifier
    pub fn name(&self) -> &'static str {
        match self {
            Self::O200kBase => "o200k_base",
            Self::Cl100kBase => "cl100k_base",
            Self::P50kBase => "p50k_base",
            Self::P50kEdit => "p50k_edit",
            Self::R50kBase => "r50k_base",
        }
    }

    /// Shared BPE instance for this encoding, built on first use
    fn bpe(&self) -> &'static CoreBPE {
        static O200K: OnceLock<CoreBPE> = OnceLock::new();
        static CL100K: OnceLock<CoreBPE> = OnceLock::new();
        static P50K: OnceLock<CoreBPE> = OnceLock::new();
        static P50K_EDIT: OnceLock<CoreBPE> = OnceLock::new();
        static R50K: OnceLock<CoreBPE> = OnceLock::new();

        // The rank tables are compiled into tiktoken-rs, so building cannot
        // fail short of a corrupted binary.
        match self {
            Self::O200kBase => O200K
                .get_or_init(|| o200k_base().expect("Failed to initialize o200k_base tokenizer")),
            Self::Cl100kBase => CL100K
                .get_or_init(|| cl100k_base().expect("Failed to initialize cl100k_base tokenizer")),
            Self::P50kBase => P50K
                .get_or_init(|| p50k_base().expect("Failed to initialize p50k_base tokenizer")),
            Self::P50kEdit => P50K_EDIT
                .get_or_init(|| p50k_edit().expect("Failed to initialize p50k_edit tokenizer")),
            Self::R50kBase => R50K
                .get_or_init(|| r50k_base().expect("Failed to initialize r50k_base tokenizer")),
        }
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "o200k_base" => Ok(Self::O200kBase),
            "cl100k_base" => Ok(Self::Cl100kBase),
            "p50k_base" => Ok(Self::P50kBase),
            "p50k_edit" => Ok(Self::P50kEdit),
            "r50k_base" | "gpt2" => Ok(Self::R50kBase),
            other => Err(ConfigError::UnknownEncoding(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// BPE token counter for one encoding
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    encoding: Encoding,
}

impl Tokenizer {
    /// Create a tokenizer for a known encoding
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// Resolve an encoding identifier, failing on unknown names
    pub fn for_encoding(identifier: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(identifier.parse()?))
    }

    /// The encoding in use
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl TokenCounter for Tokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.encoding.bpe().encode_ordinary(text).len()
    }

    fn encoding_name(&self) -> &str {
        self.encoding.name()
    }
}
