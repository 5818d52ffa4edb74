//! Token counting and budgeted truncation.
//!
//! Chunking budgets are expressed in tokens, but the core never invokes a
//! real tokenizer model: any deterministic scheme that is monotonic in
//! text length (more characters never means fewer tokens) satisfies the
//! contract. [`HeuristicTokenCounter`] uses the 4-chars-per-token
//! approximation; callers with a lexical tokenizer can implement
//! [`TokenCounter`] over it and everything downstream follows.

/// Converts text to a token count and truncates text to a token budget.
pub trait TokenCounter: Send + Sync {
    /// Count the tokens in `text`. Empty text yields 0. Must be
    /// deterministic and monotonic in text length.
    fn count(&self, text: &str) -> usize;

    /// Longest prefix of `text` whose token count is ≤ `max_tokens`.
    ///
    /// Binary search over character cut points, re-counting each candidate
    /// prefix. The cut granularity is characters, not token boundaries, so
    /// the result is the longest prefix expressible at that granularity,
    /// never one whose count exceeds the budget.
    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        if text.is_empty() {
            return String::new();
        }
        if self.count(text) <= max_tokens {
            return text.to_string();
        }

        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        // boundaries[n] is the end of an n-char prefix; find the largest n
        // whose prefix still fits.
        let mut lo = 0usize;
        let mut hi = boundaries.len() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.count(&text[..boundaries[mid]]) <= max_tokens {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        text[..boundaries[lo]].to_string()
    }
}

/// Character-ratio token counter: `ceil(chars / chars_per_token)`.
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    chars_per_token: usize,
}

impl HeuristicTokenCounter {
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for HeuristicTokenCounter {
    /// The 4 chars ≈ 1 token ratio.
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        let chars = text.chars().count();
        chars.div_ceil(self.chars_per_token)
    }
}
