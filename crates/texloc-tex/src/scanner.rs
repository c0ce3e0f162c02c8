//! Pattern scanner over raw TeX.
//!
//! [`scan_tex`] walks a TeX string left to right and reports the earliest match
//! of any of a set of named [`Pattern`]s, skipping `%` comments. Matches never
//! overlap: scanning resumes at the end of the last reported match.
//!
//! Two patterns matching at the same earliest position means the grammar is
//! ambiguous. The scanner reports [`LocatorError::ParseAmbiguity`] and stops.
//!
//! ```
//! use texloc_tex::scanner::{scan_tex, Pattern};
//!
//! # fn main() -> texloc_core::Result<()> {
//! let patterns = [Pattern::unescaped("dollar", r"\$")?];
//! let matches = scan_tex(r"$x$ costs \$5 % $ in a comment", &patterns)
//!     .collect::<texloc_core::Result<Vec<_>>>()?;
//! assert_eq!(matches.len(), 2);
//! assert_eq!((matches[1].start, matches[1].end), (2, 3));
//! # Ok(())
//! # }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use texloc_core::{LocatorError, Result};

/// A named regular expression the scanner looks for.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    regex: Regex,
    unescaped: bool,
}

impl Pattern {
    /// Create a pattern matching anywhere outside comments.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] if the regex is invalid or has
    /// capture groups. Use `(?:...)` for grouping.
    pub fn new(name: impl Into<String>, regex: &str) -> Result<Self> {
        Self::build(name.into(), regex, false)
    }

    /// Create a pattern that only matches when not escaped by a backslash.
    ///
    /// # Errors
    ///
    /// Same as [`Pattern::new`].
    pub fn unescaped(name: impl Into<String>, regex: &str) -> Result<Self> {
        Self::build(name.into(), regex, true)
    }

    fn build(name: String, regex: &str, unescaped: bool) -> Result<Self> {
        let compiled = Regex::new(regex)
            .map_err(|e| LocatorError::config(format!("pattern '{name}': {e}")))?;
        // Group 0 is the whole match
        if compiled.captures_len() > 1 {
            return Err(LocatorError::config(format!(
                "pattern '{name}' must not contain capture groups: {regex}"
            )));
        }
        Ok(Self {
            name,
            regex: compiled,
            unescaped,
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One pattern match, as a half-open byte range into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Name of the pattern that matched
    pub pattern: String,
    /// Matched text
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// True when the byte at `pos` is preceded by an odd run of backslashes.
#[must_use]
pub fn is_escaped(text: &str, pos: usize) -> bool {
    let backslashes = text.as_bytes()[..pos]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    backslashes % 2 == 1
}

/// Byte ranges of `%` comments, each running up to (not including) the newline.
#[must_use]
pub fn comment_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'%' && !is_escaped(text, pos) {
            let end = text[pos..].find('\n').map_or(text.len(), |offset| pos + offset);
            ranges.push(pos..end);
            pos = end;
        } else {
            pos += 1;
        }
    }
    ranges
}

/// Lazy iterator over the matches of a set of patterns. See [`scan_tex`].
pub struct Scanner<'t, 'p> {
    text: &'t str,
    patterns: &'p [Pattern],
    comments: Vec<Range<usize>>,
    /// Next acceptable match of each pattern; `None` once a pattern is exhausted
    lookahead: Vec<Option<Range<usize>>>,
    position: usize,
    done: bool,
}

/// Scan `text` for `patterns`. See the [module docs](self).
#[must_use]
pub fn scan_tex<'t, 'p>(text: &'t str, patterns: &'p [Pattern]) -> Scanner<'t, 'p> {
    let mut scanner = Scanner {
        text,
        patterns,
        comments: comment_ranges(text),
        lookahead: Vec::with_capacity(patterns.len()),
        position: 0,
        done: false,
    };
    scanner.lookahead = (0..patterns.len())
        .map(|index| scanner.find_from(index, 0))
        .collect();
    scanner
}

impl Scanner<'_, '_> {
    fn in_comment(&self, range: &Range<usize>) -> bool {
        self.comments
            .iter()
            .any(|comment| comment.start < range.end && range.start < comment.end)
    }

    /// Earliest acceptable match of pattern `index` starting at or after `from`.
    fn find_from(&self, index: usize, mut from: usize) -> Option<Range<usize>> {
        let pattern = &self.patterns[index];
        while from <= self.text.len() {
            let found = pattern.regex.find_at(self.text, from)?;
            let range = found.range();
            let rejected = range.is_empty()
                || (pattern.unescaped && is_escaped(self.text, range.start))
                || self.in_comment(&range);
            if !rejected {
                return Some(range);
            }
            // Retry one character past the rejected start
            from = range.start
                + self.text[range.start..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
        None
    }
}

impl Iterator for Scanner<'_, '_> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for index in 0..self.patterns.len() {
            let stale = self.lookahead[index]
                .as_ref()
                .is_some_and(|range| range.start < self.position);
            if stale {
                self.lookahead[index] = self.find_from(index, self.position);
            }
        }

        let Some(earliest) = self.lookahead.iter().flatten().map(|r| r.start).min() else {
            self.done = true;
            return None;
        };
        let winners: Vec<usize> = (0..self.patterns.len())
            .filter(|&i| self.lookahead[i].as_ref().is_some_and(|r| r.start == earliest))
            .collect();

        if winners.len() > 1 {
            self.done = true;
            let patterns = winners
                .iter()
                .map(|&i| self.patterns[i].name.clone())
                .collect();
            return Some(Err(LocatorError::ParseAmbiguity {
                position: earliest,
                patterns,
            }));
        }

        let winner = winners[0];
        let range = self.lookahead[winner].clone()?;
        self.position = range.end;
        Some(Ok(Match {
            pattern: self.patterns[winner].name.clone(),
            text: self.text[range.clone()].to_string(),
            start: range.start,
            end: range.end,
        }))
    }
}

impl std::iter::FusedIterator for Scanner<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scan(text: &str, patterns: &[Pattern]) -> Vec<Match> {
        scan_tex(text, patterns)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_matches_are_ordered_and_named() {
        let patterns = [
            Pattern::new("begin", r"\\begin\{[a-z]+\}").unwrap(),
            Pattern::new("end", r"\\end\{[a-z]+\}").unwrap(),
        ];
        let matches = scan(r"\begin{a} x \end{a} \begin{b}", &patterns);
        let names: Vec<&str> = matches.iter().map(|m| m.pattern.as_str()).collect();
        assert_eq!(names, ["begin", "end", "begin"]);
        assert_eq!(matches[1].text, r"\end{a}");
        assert_eq!((matches[1].start, matches[1].end), (12, 19));
    }

    #[test]
    fn test_comments_are_skipped() {
        let patterns = [Pattern::new("word", "cite").unwrap()];
        let text = "cite % cite\ncite \\% cite";
        let starts: Vec<usize> = scan(text, &patterns).iter().map(|m| m.start).collect();
        assert_eq!(starts, [0, 12, 20]);
    }

    #[rstest]
    #[case(r"$", 1)]
    #[case(r"\$", 0)]
    #[case(r"\\$", 1)]
    #[case(r"\\\$", 0)]
    fn test_unescaped_patterns(#[case] text: &str, #[case] expected: usize) {
        let patterns = [Pattern::unescaped("dollar", r"\$").unwrap()];
        assert_eq!(scan(text, &patterns).len(), expected);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let patterns = [
            Pattern::new("pair", "ab").unwrap(),
            Pattern::new("single", "b").unwrap(),
        ];
        let matches = scan("abb", &patterns);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].pattern, "pair");
        assert_eq!(matches[1].start, 2);
    }

    #[test]
    fn test_ambiguity_is_reported_then_fuses() {
        let patterns = [
            Pattern::new("one", r"\$").unwrap(),
            Pattern::new("two", r"\$\$").unwrap(),
        ];
        let mut scanner = scan_tex("x $$", &patterns);
        match scanner.next() {
            Some(Err(LocatorError::ParseAmbiguity { position, patterns })) => {
                assert_eq!(position, 2);
                assert_eq!(patterns, ["one", "two"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_capture_groups_rejected() {
        let err = Pattern::new("bad", r"\\cite\{(.*)\}").unwrap_err();
        assert!(err.is_fatal());
        assert!(Pattern::new("ok", r"\\cite(?:p|t)?").is_ok());
    }

    #[test]
    fn test_zero_width_matches_ignored() {
        let patterns = [Pattern::new("maybe", "x*").unwrap()];
        let matches = scan("ab xx c", &patterns);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "xx");
    }
}
