//! Balanced argument parsing after a TeX command.

use serde::{Deserialize, Serialize};
use texloc_core::{LocatorError, Result};

/// Kind of one argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentKind {
    /// `[...]`, may be absent
    Optional,
    /// `{...}`, must be present
    Required,
}

/// Argument slots a command takes, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacroSignature {
    slots: Vec<ArgumentKind>,
}

impl MacroSignature {
    /// Parse a signature written as brackets, e.g. `"[]{}"` for one optional
    /// argument followed by one required argument.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] for anything other than `[]` and `{}` pairs.
    pub fn parse(signature: &str) -> Result<Self> {
        let compact: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        let mut slots = Vec::with_capacity(compact.len() / 2);
        let mut rest = compact.as_str();
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("[]") {
                slots.push(ArgumentKind::Optional);
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("{}") {
                slots.push(ArgumentKind::Required);
                rest = tail;
            } else {
                return Err(LocatorError::config(format!(
                    "invalid macro signature '{signature}'"
                )));
            }
        }
        Ok(Self { slots })
    }

    #[must_use]
    pub fn slots(&self) -> &[ArgumentKind] {
        &self.slots
    }
}

/// Location of one parsed argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentSpan {
    pub kind: ArgumentKind,
    /// Offset of the opening delimiter
    pub start: usize,
    /// Offset just past the closing delimiter
    pub end: usize,
    pub content_start: usize,
    pub content_end: usize,
}

impl ArgumentSpan {
    /// Text between the delimiters.
    #[must_use]
    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.content_start..self.content_end]
    }
}

/// Arguments found after a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArguments {
    /// One entry per signature slot; `None` for an absent optional argument
    pub arguments: Vec<Option<ArgumentSpan>>,
    /// Offset just past the last parsed argument, or the starting offset
    pub end: usize,
}

impl ParsedArguments {
    /// The `n`-th required argument.
    #[must_use]
    pub fn required(&self, n: usize) -> Option<&ArgumentSpan> {
        self.arguments
            .iter()
            .flatten()
            .filter(|arg| arg.kind == ArgumentKind::Required)
            .nth(n)
    }

    /// The `n`-th optional slot, if it was given.
    #[must_use]
    pub fn optional(&self, n: usize) -> Option<&ArgumentSpan> {
        self.arguments
            .iter()
            .flatten()
            .filter(|arg| arg.kind == ArgumentKind::Optional)
            .nth(n)
    }
}

fn skip_whitespace(text: &str, pos: usize) -> usize {
    pos + text[pos..]
        .bytes()
        .take_while(u8::is_ascii_whitespace)
        .count()
}

/// Offset of the delimiter closing the one opened at `open`.
///
/// Braces nest and backslash escapes are honored. For `[` arguments a `]`
/// inside braces does not close the argument.
fn find_closing(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let bracket = bytes[open] == b'[';
    let mut brace_depth = usize::from(!bracket);
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => brace_depth += 1,
            b'}' if brace_depth == 0 => return None,
            b'}' => {
                brace_depth -= 1;
                if !bracket && brace_depth == 0 {
                    return Some(pos);
                }
            }
            b']' if bracket && brace_depth == 0 => return Some(pos),
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Parse arguments matching `signature` starting at byte `pos` of `text`.
///
/// Whitespace between arguments is skipped. Returns `None` when a required
/// argument is missing or unbalanced.
#[must_use]
pub fn parse_arguments(text: &str, pos: usize, signature: &MacroSignature) -> Option<ParsedArguments> {
    let mut arguments = Vec::with_capacity(signature.slots.len());
    let mut end = pos;

    for &kind in &signature.slots {
        let start = skip_whitespace(text, end);
        let opener = match kind {
            ArgumentKind::Optional => b'[',
            ArgumentKind::Required => b'{',
        };
        if text.as_bytes().get(start) != Some(&opener) {
            if kind == ArgumentKind::Required {
                return None;
            }
            arguments.push(None);
            continue;
        }

        let close = find_closing(text, start)?;
        arguments.push(Some(ArgumentSpan {
            kind,
            start,
            end: close + 1,
            content_start: start + 1,
            content_end: close,
        }));
        end = close + 1;
    }

    Some(ParsedArguments { arguments, end })
}
