//! Token counting for cost estimation.
//!
//! Two BPE encodings are reported side by side: `o200k_base`, used by the
//! GPT-4o family, and `cl100k_base`, used by GPT-4 and GPT-3.5.

use crate::error::PaperScanError;
use tiktoken_rs::CoreBPE;

/// The encodings every page is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenEncoding {
    O200kBase,
    Cl100kBase,
}

impl TokenEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TokenEncoding::O200kBase => "o200k_base",
            TokenEncoding::Cl100kBase => "cl100k_base",
        }
    }
}

/// Given text and an encoding, return a token count.
pub trait TokenCounter: Send + Sync {
    fn count(&self, encoding: TokenEncoding, text: &str) -> usize;
}

/// [`TokenCounter`] over the `tiktoken-rs` BPE tables.
pub struct TiktokenCounter {
    o200k: CoreBPE,
    cl100k: CoreBPE,
}

impl TiktokenCounter {
    /// Load both BPE tables. They are embedded in `tiktoken-rs`, so this
    /// does not touch the network.
    pub fn new() -> Result<Self, PaperScanError> {
        Ok(Self {
            o200k: tiktoken_rs::o200k_base().map_err(unavailable(TokenEncoding::O200kBase))?,
            cl100k: tiktoken_rs::cl100k_base().map_err(unavailable(TokenEncoding::Cl100kBase))?,
        })
    }
}

fn unavailable<E: std::fmt::Display>(encoding: TokenEncoding) -> impl Fn(E) -> PaperScanError {
    move |e| PaperScanError::TokenizerUnavailable {
        encoding: encoding.name().to_string(),
        detail: e.to_string(),
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, encoding: TokenEncoding, text: &str) -> usize {
        let bpe = match encoding {
            TokenEncoding::O200kBase => &self.o200k,
            TokenEncoding::Cl100kBase => &self.cl100k,
        };
        // Special-token text found in a paper is counted as ordinary text.
        bpe.encode_ordinary(text).len()
    }
}

/// Characters other than whitespace.
pub fn non_empty_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_chars_ignores_whitespace() {
        assert_eq!(non_empty_chars("a b\nc\t d"), 4);
        assert_eq!(non_empty_chars(""), 0);
        assert_eq!(non_empty_chars("  \n "), 0);
    }

    #[test]
    fn tiktoken_counts_tokens() {
        let counter = TiktokenCounter::new().expect("tables are embedded");
        assert_eq!(counter.count(TokenEncoding::O200kBase, ""), 0);
        let n = counter.count(TokenEncoding::Cl100kBase, "hello world");
        assert_eq!(n, 2);
        assert!(counter.count(TokenEncoding::O200kBase, "Attention is all you need.") > 0);
    }
}
