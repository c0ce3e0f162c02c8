//! Spans found by other tools and handed to the colorizer.
//!
//! Symbols come from parsing an equation's content with a math parser, terms
//! from glossary or definition detectors. Neither is found by the scanner.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A symbol inside an equation, made of one or more character spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    /// Index of the enclosing equation
    pub equation_index: usize,
    /// Byte ranges of the symbol's characters in the TeX file
    pub characters: Vec<Range<usize>>,
}

impl Symbol {
    /// Range covering every character, `None` when there are none.
    #[must_use]
    pub fn span(&self) -> Option<Range<usize>> {
        let start = self.characters.iter().map(|r| r.start).min()?;
        let end = self.characters.iter().map(|r| r.end).max()?;
        Some(start..end)
    }
}

/// A plain text span, such as a defined term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_span_covers_characters() {
        let symbol = Symbol {
            id: "symbol-0".to_string(),
            equation_index: 0,
            characters: vec![12..13, 9..10, 10..11],
        };
        assert_eq!(symbol.span(), Some(9..13));

        let empty = Symbol {
            characters: vec![],
            ..symbol
        };
        assert_eq!(empty.span(), None);
    }
}
