use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 80;

// Boundary strength at a cut position; a cut at `i` ends a window just before `chars[i]`.
const NO_BOUNDARY: u8 = 0;
const WORD: u8 = 1;
const SENTENCE: u8 = 2;
const LINE: u8 = 3;
const PARAGRAPH: u8 = 4;

/// Character span of the source text. Offsets count `char`s, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Overlapping window splitter that prefers paragraph, then line, then sentence, then
/// word boundaries before cutting mid-word.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextSplitter {
    /// `overlap` is capped at half the window so every window advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(2);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size / 2),
        }
    }

    pub fn split(&self, text: &str) -> Vec<TextWindow> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars = text.chars().collect::<Vec<_>>();
        let ranks = boundary_ranks(text, &chars);
        let total = chars.len();

        let mut windows = Vec::new();
        let mut start = 0usize;

        loop {
            let end = if total - start <= self.chunk_size {
                total
            } else {
                self.cut_position(&ranks, start)
            };

            windows.push(TextWindow {
                start,
                end,
                text: chars[start..end].iter().collect(),
            });

            if end == total {
                break;
            }

            start = self.next_start(&ranks, end);
        }

        windows
    }

    fn cut_position(&self, ranks: &[u8], start: usize) -> usize {
        let limit = start + self.chunk_size;
        let floor = start + self.chunk_size / 2;

        for level in [PARAGRAPH, LINE, SENTENCE, WORD] {
            if let Some(cut) = ((floor + 1)..=limit).rev().find(|&i| ranks[i] >= level) {
                return cut;
            }
        }

        limit
    }

    fn next_start(&self, ranks: &[u8], end: usize) -> usize {
        if self.overlap == 0 {
            return end;
        }

        let from = end - self.overlap;
        (from..end)
            .find(|&i| ranks[i] >= WORD)
            .unwrap_or(from)
    }
}

fn boundary_ranks(text: &str, chars: &[char]) -> Vec<u8> {
    let mut ranks = vec![NO_BOUNDARY; chars.len() + 1];

    let sentence_starts = text
        .split_sentence_bound_indices()
        .map(|(byte_idx, _)| byte_idx)
        .collect::<HashSet<_>>();

    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        if char_idx > 0 && sentence_starts.contains(&byte_idx) {
            ranks[char_idx] = SENTENCE;
        }
    }

    for i in 1..chars.len() {
        let rank = if chars[i - 1] == '\n' && i >= 2 && chars[i - 2] == '\n' {
            PARAGRAPH
        } else if chars[i - 1] == '\n' {
            LINE
        } else if chars[i - 1].is_whitespace() {
            WORD
        } else {
            NO_BOUNDARY
        };
        ranks[i] = ranks[i].max(rank);
    }

    ranks
}
