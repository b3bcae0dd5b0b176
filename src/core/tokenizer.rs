//! Word tokenization and token frequencies.
//!
//! [`Tokenizer::tokens`] turns a message text into a lazy sequence of
//! lower-cased words. Punctuation is stripped, URLs are dropped, inner
//! apostrophes and hyphens are kept (`don't`, `well-known`), stop words and
//! words shorter than the configured minimum are removed.
//!
//! # Example
//!
//! ```rust
//! use tglens::core::tokenizer::Tokenizer;
//!
//! # fn main() -> tglens::Result<()> {
//! let tokenizer = Tokenizer::with_defaults()?;
//! let tokens: Vec<String> = tokenizer
//!     .tokens("Check https://example.com, it's a well-known site!")
//!     .collect();
//!
//! assert_eq!(tokens, vec!["check", "it's", "well-known", "site"]);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::str::SplitWhitespace;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TokenizerConfig;
use crate::error::{Result, TglensError};

const URL_PATTERN: &str = r"^(?i:https?://|www\.)";

/// Built-in stop words: common English and Russian function words plus chat
/// filler.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    // English
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "a", "an",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "i", "you", "he",
    "she", "it", "we", "they", "me", "him", "her", "us", "them", "this", "that", "these",
    "those", "my", "your", "his", "its", "our", "their", "will", "would", "could", "should",
    "can", "may", "might", "must", "shall", "not", "no", "yes", "ok", "okay", "just", "now",
    "so", "well", "like", "really",
    // Russian
    "это", "что", "тот", "быть", "весь", "как", "она", "так", "его", "но", "да", "ты", "к",
    "у", "же", "вы", "за", "бы", "по", "только", "ее", "мне", "было", "вот", "от", "меня",
    "еще", "нет", "о", "из", "ему", "теперь", "когда", "даже", "ну", "вдруг", "ли", "если",
    "уже", "или", "ни", "был", "него", "до", "вас", "нибудь", "опять", "уж", "вам", "ведь",
    "там", "потом", "себя", "и", "в", "во", "не", "он", "на", "я", "с", "со", "а", "то", "все",
    "ей", "они", "где", "есть", "надо", "ней", "для", "мы", "тебя", "их", "чем", "была", "сам",
    "чтоб", "без", "будто", "чего", "раз", "тоже", "себе", "под", "будет", "ж", "тогда", "кто",
    "этот", "того", "потому", "этой", "над", "всех", "нас", "при", "были", "будем", "будут",
    "этого", "которой", "которые", "которых", "которому", "которая", "которое", "которую",
    "очень", "также", "кроме", "первый", "хорошо", "через", "можете", "знаю", "сказать",
    "какой", "нужно", "че", "чё",
];

/// Splits text into normalized word tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
    min_token_len: usize,
    url_regex: Option<Regex>,
}

impl Tokenizer {
    /// Creates a tokenizer from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TglensError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        config.validate()?;

        let mut stop_words: HashSet<String> = HashSet::new();
        if config.default_stop_words {
            stop_words.extend(DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()));
        }
        stop_words.extend(config.extra_stop_words.iter().map(|w| normalize_word(w.trim())));

        let url_regex = if config.strip_urls {
            Some(
                Regex::new(URL_PATTERN)
                    .map_err(|e| TglensError::invalid_config("url pattern", e.to_string()))?,
            )
        } else {
            None
        };

        Ok(Self {
            stop_words,
            min_token_len: config.min_token_len,
            url_regex,
        })
    }

    /// Creates a tokenizer with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&TokenizerConfig::default())
    }

    /// Returns a lazy iterator over the tokens of `text`.
    ///
    /// The iterator is `Clone`; calling `tokens` again restarts from the
    /// beginning.
    pub fn tokens<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            tokenizer: self,
            chunks: text.split_whitespace(),
            rest: "",
        }
    }

    /// Returns `true` if `word` (already normalized) is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    fn is_url(&self, chunk: &str) -> bool {
        self.url_regex.as_ref().is_some_and(|re| re.is_match(chunk))
    }

    fn accepts(&self, token: &str) -> bool {
        token.chars().count() >= self.min_token_len && !self.is_stop_word(token)
    }
}

/// Lazy token sequence returned by [`Tokenizer::tokens`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    tokenizer: &'a Tokenizer,
    chunks: SplitWhitespace<'a>,
    rest: &'a str,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                let chunk = self.chunks.next()?;
                if self.tokenizer.is_url(chunk) {
                    continue;
                }
                self.rest = chunk;
            }

            let (word, rest) = next_word(self.rest);
            self.rest = rest;
            if let Some(word) = word {
                let token = normalize_word(word);
                if self.tokenizer.accepts(&token) {
                    return Some(token);
                }
            }
        }
    }
}

fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '’' | '-')
}

/// Finds the next word in `s`. Joiners are part of a word only between two
/// alphanumeric characters.
fn next_word(s: &str) -> (Option<&str>, &str) {
    let Some(start) = s.find(char::is_alphanumeric) else {
        return (None, "");
    };

    let tail = &s[start..];
    let mut end = 0;
    let mut chars = tail.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_alphanumeric() {
            end = i + c.len_utf8();
        } else if is_joiner(c) && chars.peek().is_some_and(|&(_, next)| next.is_alphanumeric()) {
            continue;
        } else {
            break;
        }
    }

    (Some(&tail[..end]), &tail[end..])
}

fn normalize_word(word: &str) -> String {
    word.to_lowercase().replace('’', "'")
}

/// Token → occurrence count, ordered by token.
///
/// Serializes as a JSON map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenFrequency {
    counts: BTreeMap<String, u64>,
}

impl TokenFrequency {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `token`.
    pub fn add(&mut self, token: impl Into<String>) {
        *self.counts.entry(token.into()).or_insert(0) += 1;
    }

    /// Counts every token of `text`.
    pub fn add_text(&mut self, tokenizer: &Tokenizer, text: &str) {
        for token in tokenizer.tokens(text) {
            self.add(token);
        }
    }

    /// Occurrences of `token`.
    pub fn get(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    /// Total occurrences of all tokens.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Returns `true` if no token was counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over `(token, count)` in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// The `n` most frequent tokens, count descending then token ascending.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

impl<S: Into<String>> FromIterator<S> for TokenFrequency {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut freq = TokenFrequency::new();
        for token in iter {
            freq.add(token);
        }
        freq
    }
}
