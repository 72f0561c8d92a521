use log::debug;
use once_cell::sync::Lazy;
use tiktoken_rs::CoreBPE;

use crate::ai::models;

/// Tokenizer family used to count tokens for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Cl100k,
    O200k,
    /// `ceil(chars / 4)`, used when no tokenizer is known.
    Approximate,
}

static CL100K: Lazy<Option<CoreBPE>> = Lazy::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        debug!("cl100k_base unavailable, using approximation: {e}");
        None
    }
});

static O200K: Lazy<Option<CoreBPE>> = Lazy::new(|| match tiktoken_rs::o200k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        debug!("o200k_base unavailable, using approximation: {e}");
        None
    }
});

impl Encoding {
    /// Picks the encoding for a model name. Registered models use their table entry,
    /// OpenAI-style names are matched by prefix, anything else is approximated.
    pub fn for_model(model: &str) -> Self {
        if let Some(spec) = models::find(model) {
            return spec.encoding;
        }

        let lower = model.to_ascii_lowercase();
        if lower.starts_with("gpt-4o") || lower.starts_with("o1") || lower.starts_with("o3") {
            Encoding::O200k
        } else if lower.starts_with("gpt-4") || lower.starts_with("gpt-3.5") {
            Encoding::Cl100k
        } else {
            Encoding::Approximate
        }
    }

    fn bpe(self) -> Option<&'static CoreBPE> {
        match self {
            Encoding::Cl100k => CL100K.as_ref(),
            Encoding::O200k => O200K.as_ref(),
            Encoding::Approximate => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TokenCounter {
    encoding: Encoding,
}

impl TokenCounter {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn for_model(model: &str) -> Self {
        Self::new(Encoding::for_model(model))
    }

    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encoding.bpe() {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => approximate(text),
        }
    }
}

/// Counts the tokens of `text` with the tokenizer of `model`.
pub fn count_tokens(text: &str, model: &str) -> usize {
    TokenCounter::for_model(model).count(text)
}

fn approximate(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
