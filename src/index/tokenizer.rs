//! Edge n-gram tokenization.
//!
//! Emits the prefixes of each word (or of the whole text) whose length in
//! chars lies within `min_gram..=max_gram`. Tokens keep their original case;
//! the analyzers in `schema` lowercase and fold them.

use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

/// Splits text into runs of alphanumeric chars, yielding `(byte_offset, word)`.
pub fn split_words(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;

    for (idx, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(idx),
            (false, Some(from)) => {
                words.push((from, &text[from..idx]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(from) = start {
        words.push((from, &text[from..]));
    }

    words
}

#[derive(Clone, Debug)]
pub struct EdgeNgramTokenizer {
    min_gram: usize,
    max_gram: usize,
    per_word: bool,
}

impl EdgeNgramTokenizer {
    /// Prefixes anchored at the start of every word.
    pub fn words(min_gram: usize, max_gram: usize) -> Self {
        Self {
            min_gram: min_gram.max(1),
            max_gram,
            per_word: true,
        }
    }

    /// Prefixes of the whole (trimmed) text.
    pub fn whole_text(min_gram: usize, max_gram: usize) -> Self {
        Self {
            min_gram: min_gram.max(1),
            max_gram,
            per_word: false,
        }
    }

    fn push_prefixes(&self, tokens: &mut Vec<Token>, position: usize, offset: usize, segment: &str) {
        let ends = segment
            .char_indices()
            .map(|(idx, c)| idx + c.len_utf8())
            .take(self.max_gram)
            .skip(self.min_gram - 1);

        for end in ends {
            tokens.push(Token {
                offset_from: offset,
                offset_to: offset + end,
                position,
                text: segment[..end].to_string(),
                position_length: 1,
            });
        }
    }
}

impl Tokenizer for EdgeNgramTokenizer {
    type TokenStream<'a> = EdgeNgramTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let mut tokens = Vec::new();

        if self.per_word {
            for (position, (offset, word)) in split_words(text).into_iter().enumerate() {
                self.push_prefixes(&mut tokens, position, offset, word);
            }
        } else {
            let trimmed = text.trim_start();
            let offset = text.len() - trimmed.len();
            self.push_prefixes(&mut tokens, 0, offset, trimmed.trim_end());
        }

        EdgeNgramTokenStream { tokens, next: 0 }
    }
}

pub struct EdgeNgramTokenStream {
    tokens: Vec<Token>,
    next: usize,
}

impl TokenStream for EdgeNgramTokenStream {
    fn advance(&mut self) -> bool {
        if self.next < self.tokens.len() {
            self.next += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.next.saturating_sub(1)]
    }

    fn token_mut(&mut self) -> &mut Token {
        let idx = self.next.saturating_sub(1);
        &mut self.tokens[idx]
    }
}
