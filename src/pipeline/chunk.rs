//! Size-bounded splitting of section text into chunk files.
//!
//! Splitting prefers the coarsest boundary that fits:
//!
//! 1. paragraphs (`"\n\n"`) are packed greedily into a chunk;
//! 2. a paragraph that alone exceeds the limit is broken at sentence ends
//!    (`.`, `!` or `?` followed by whitespace) and its sentences are packed
//!    greedily, joined by single spaces;
//! 3. a single sentence longer than the limit becomes its own chunk. Text is
//!    never cut mid-sentence.
//!
//! Sizes are counted in characters, separators included, so every chunk built
//! from pieces that fit stays within `max_chars`.
//!
//! With overlap enabled, every chunk after the first starts with the tail of
//! the previous chunk followed by [`OVERLAP_MARKER`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkingConfig;

/// Separator placed between the repeated tail and the chunk body.
pub const OVERLAP_MARKER: &str = "\n\n... [previous chunk overlap] ...\n\n";

const PARAGRAPH_SEP: &str = "\n\n";
const SENTENCE_SEP: &str = " ";

static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Stateless chunk splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSplitter {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl From<&ChunkingConfig> for ChunkSplitter {
    fn from(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chars, config.overlap_chars)
    }
}

impl ChunkSplitter {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars,
            overlap_chars,
        }
    }

    /// Split `text` into ordered chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut packer = Packer::new(self.max_chars, PARAGRAPH_SEP);
        let mut chunks = Vec::new();

        for paragraph in text.split(PARAGRAPH_SEP).filter(|p| !p.is_empty()) {
            if char_len(paragraph) > self.max_chars {
                chunks.extend(packer.finish());
                chunks.extend(self.split_paragraph(paragraph));
            } else if let Some(full) = packer.push(paragraph) {
                chunks.push(full);
            }
        }
        chunks.extend(packer.finish());

        if self.overlap_chars > 0 && chunks.len() > 1 {
            self.add_overlap(chunks)
        } else {
            chunks
        }
    }

    fn split_paragraph(&self, paragraph: &str) -> Vec<String> {
        let mut packer = Packer::new(self.max_chars, SENTENCE_SEP);
        let mut chunks = Vec::new();
        for sentence in split_sentences(paragraph) {
            if let Some(full) = packer.push(sentence) {
                chunks.push(full);
            }
        }
        chunks.extend(packer.finish());
        chunks
    }

    fn add_overlap(&self, chunks: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(chunks.len());
        let mut previous: Option<String> = None;

        for chunk in chunks {
            let body = match previous.as_deref().map(|p| tail_chars(p, self.overlap_chars)) {
                Some(tail) if !tail.is_empty() => format!("{tail}{OVERLAP_MARKER}{chunk}"),
                _ => chunk.clone(),
            };
            out.push(body);
            previous = Some(chunk);
        }
        out
    }
}

/// Convenience wrapper around [`ChunkSplitter::split`].
pub fn split_into_chunks(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    ChunkSplitter::new(max_chars, overlap_chars).split(text)
}

/// Greedy accumulator for one level of the split.
struct Packer<'a> {
    max_chars: usize,
    sep: &'a str,
    parts: Vec<&'a str>,
    size: usize,
}

impl<'a> Packer<'a> {
    fn new(max_chars: usize, sep: &'a str) -> Self {
        Self {
            max_chars,
            sep,
            parts: Vec::new(),
            size: 0,
        }
    }

    /// Add `piece`; returns the previous chunk if `piece` did not fit into it.
    fn push(&mut self, piece: &'a str) -> Option<String> {
        let piece_len = char_len(piece);
        let grown = if self.parts.is_empty() {
            piece_len
        } else {
            self.size + char_len(self.sep) + piece_len
        };

        if grown <= self.max_chars || self.parts.is_empty() {
            self.parts.push(piece);
            self.size = grown;
            None
        } else {
            let full = self.finish();
            self.parts.push(piece);
            self.size = piece_len;
            full
        }
    }

    fn finish(&mut self) -> Option<String> {
        if self.parts.is_empty() {
            return None;
        }
        let joined = self.parts.join(self.sep);
        self.parts.clear();
        self.size = 0;
        Some(joined)
    }
}

/// Sentences of `paragraph`, each keeping its terminal punctuation.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(paragraph) {
        // The terminator is a single ASCII byte.
        sentences.push(&paragraph[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&paragraph[start..]);
    sentences.retain(|s| !s.is_empty());
    sentences
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of `s` (all of `s` if it is shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if len <= n {
        return s;
    }
    s.char_indices()
        .nth(len - n)
        .map(|(i, _)| &s[i..])
        .unwrap_or(s)
}
