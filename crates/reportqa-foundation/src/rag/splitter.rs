//! Recursive text splitter
//!
//! Splits text using a hierarchy of separators, trying the most meaningful
//! boundary first (paragraphs, lines, sentences, words) and slicing
//! characters only when nothing else fits. Adjacent pieces are merged
//! greedily up to the target size, carrying a tail of the previous piece
//! as overlap.
//!
//! All sizes are counted in characters, not bytes.

use std::collections::VecDeque;

/// Default separators, most to least meaningful.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Recursive splitter with a hard upper bound on piece length.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    target_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Create a splitter. Callers validate `overlap < target_size`.
    #[must_use]
    pub fn new(target_size: usize, overlap: usize) -> Self {
        Self {
            target_size,
            overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator hierarchy.
    #[must_use]
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into trimmed, non-empty pieces of at most `target_size`
    /// characters each.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.target_size {
            return vec![text.trim().to_string()];
        }
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // First separator that occurs in the text; the rest are for oversized parts.
        let position = separators.iter().position(|sep| text.contains(sep.as_str()));
        let Some(position) = position else {
            return self.hard_split(text);
        };
        let separator = separators[position].as_str();
        let finer = &separators[position + 1..];

        let mut pieces = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for part in text.split(separator).filter(|p| !p.trim().is_empty()) {
            if char_len(part) <= self.target_size {
                pending.push(part);
                continue;
            }

            if !pending.is_empty() {
                pieces.extend(self.merge(&pending, separator));
                pending.clear();
            }
            pieces.extend(self.split_recursive(part, finer));
        }

        if !pending.is_empty() {
            pieces.extend(self.merge(&pending, separator));
        }

        pieces
    }

    /// Greedily join parts with `separator` into pieces no longer than
    /// `target_size`, starting each new piece with up to `overlap`
    /// characters worth of trailing parts from the previous one.
    fn merge(&self, parts: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut pieces = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &part in parts {
            let len = char_len(part);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + joiner + len > self.target_size && !window.is_empty() {
                push_piece(&mut pieces, &window, separator);

                // Shrink the window down to the overlap budget, and further
                // if the incoming part still would not fit.
                while total > self.overlap
                    || (total > 0
                        && total + if window.is_empty() { 0 } else { sep_len } + len
                            > self.target_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }

            let joiner = if window.is_empty() { 0 } else { sep_len };
            window.push_back(part);
            total += len + joiner;
        }

        push_piece(&mut pieces, &window, separator);
        pieces
    }

    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.target_size.saturating_sub(self.overlap).max(1);
        let mut pieces = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.target_size).min(chars.len());
            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
            if end >= chars.len() {
                break;
            }
            start += step;
        }

        pieces
    }
}

fn push_piece(pieces: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    if window.is_empty() {
        return;
    }
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
