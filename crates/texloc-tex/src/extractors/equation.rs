//! Balanced math span extraction.

use super::EntityExtractor;
use crate::scanner::{scan_tex, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;
use texloc_core::Result;

/// Math environments recognized by [`EquationExtractor`], each optionally starred.
pub const MATH_ENVIRONMENTS: &[&str] = &[
    "equation",
    "align",
    "gather",
    "multline",
    "eqnarray",
    "flalign",
    "alignat",
    "displaymath",
    "math",
];

/// How an equation was delimited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delimiter {
    /// `$...$`
    Dollar,
    /// `$$...$$`
    DoubleDollar,
    /// `\(...\)`
    Paren,
    /// `\[...\]`
    Bracket,
    /// `\begin{env}...\end{env}`, name including any `*`
    Environment(String),
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dollar => write!(f, "$"),
            Self::DoubleDollar => write!(f, "$$"),
            Self::Paren => write!(f, r"\("),
            Self::Bracket => write!(f, r"\["),
            Self::Environment(name) => write!(f, "{name}"),
        }
    }
}

/// A balanced math span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equation {
    /// Sequential index, in the order equations close
    pub index: usize,
    /// Start of the opening delimiter
    pub start: usize,
    /// End of the closing delimiter
    pub end: usize,
    pub content_start: usize,
    pub content_end: usize,
    pub content: String,
    /// Number of equations enclosing this one
    pub depth: usize,
    pub delimiter: Delimiter,
}

impl Equation {
    #[must_use]
    pub fn id(&self) -> String {
        format!("equation-{}", self.index)
    }
}

/// One delimiter occurrence, opening or closing.
struct Delimit {
    delimiter: Delimiter,
    closes: bool,
    start: usize,
    end: usize,
}

impl Delimit {
    const fn open(delimiter: Delimiter, start: usize, end: usize) -> Self {
        Self {
            delimiter,
            closes: false,
            start,
            end,
        }
    }

    const fn close(delimiter: Delimiter, start: usize, end: usize) -> Self {
        Self {
            delimiter,
            closes: true,
            start,
            end,
        }
    }
}

struct OpenMarker {
    delimiter: Delimiter,
    start: usize,
    content_start: usize,
}

/// Extracts equations by tracking open math delimiters on an explicit stack.
///
/// A closing delimiter pops the nearest open marker of its kind, discarding
/// any unclosed markers above it. `$` and `$$` toggle: they close when an open
/// marker of the same kind is on top of the stack and open otherwise. Inside
/// `$...$`, a `$$` is a closing `$` directly followed by an opening one. Markers
/// still open at the end of the input are dropped.
#[derive(Debug, Clone)]
pub struct EquationExtractor {
    patterns: Vec<Pattern>,
}

impl EquationExtractor {
    /// Build the extractor's scanner grammar.
    ///
    /// # Errors
    ///
    /// Returns an error only if the built-in patterns fail to compile.
    pub fn new() -> Result<Self> {
        let environments = MATH_ENVIRONMENTS.join("|");
        let patterns = vec![
            Pattern::unescaped("math_shift", r"\$\$|\$")?,
            Pattern::unescaped("paren_open", r"\\\(")?,
            Pattern::unescaped("paren_close", r"\\\)")?,
            Pattern::unescaped("bracket_open", r"\\\[")?,
            Pattern::unescaped("bracket_close", r"\\\]")?,
            Pattern::unescaped("begin_env", &format!(r"\\begin\s*\{{(?:{environments})\*?\}}"))?,
            Pattern::unescaped("end_env", &format!(r"\\end\s*\{{(?:{environments})\*?\}}"))?,
        ];
        Ok(Self { patterns })
    }
}

/// Environment name inside `\begin{...}` or `\end{...}`.
fn environment_name(command: &str) -> String {
    command
        .split_once('{')
        .map(|(_, rest)| rest.trim_end_matches('}').to_string())
        .unwrap_or_default()
}

impl EntityExtractor for EquationExtractor {
    type Entity = Equation;

    fn parse(&self, tex: &str) -> Result<Vec<Equation>> {
        let mut stack: Vec<OpenMarker> = Vec::new();
        let mut equations = Vec::new();

        for found in scan_tex(tex, &self.patterns) {
            let found = found?;
            let inline_open = stack
                .last()
                .is_some_and(|top| top.delimiter == Delimiter::Dollar);
            let mut events = Vec::with_capacity(2);
            match found.pattern.as_str() {
                // `$a$$b$`: inside inline math, `$$` closes one formula and opens the next
                "math_shift" if found.text == "$$" && inline_open => {
                    let middle = found.start + 1;
                    events.push(Delimit::close(Delimiter::Dollar, found.start, middle));
                    events.push(Delimit::open(Delimiter::Dollar, middle, found.end));
                }
                "math_shift" => {
                    let delimiter = if found.text == "$$" {
                        Delimiter::DoubleDollar
                    } else {
                        Delimiter::Dollar
                    };
                    let closes = stack.last().is_some_and(|top| top.delimiter == delimiter);
                    events.push(Delimit {
                        delimiter,
                        closes,
                        start: found.start,
                        end: found.end,
                    });
                }
                "paren_open" => events.push(Delimit::open(Delimiter::Paren, found.start, found.end)),
                "paren_close" => events.push(Delimit::close(Delimiter::Paren, found.start, found.end)),
                "bracket_open" => {
                    events.push(Delimit::open(Delimiter::Bracket, found.start, found.end));
                }
                "bracket_close" => {
                    events.push(Delimit::close(Delimiter::Bracket, found.start, found.end));
                }
                pattern => {
                    let delimiter = Delimiter::Environment(environment_name(&found.text));
                    events.push(Delimit {
                        delimiter,
                        closes: pattern == "end_env",
                        start: found.start,
                        end: found.end,
                    });
                }
            }

            for event in events {
                if !event.closes {
                    stack.push(OpenMarker {
                        delimiter: event.delimiter,
                        start: event.start,
                        content_start: event.end,
                    });
                    continue;
                }

                let Some(position) = stack.iter().rposition(|open| open.delimiter == event.delimiter)
                else {
                    log::debug!(
                        "Unmatched closing delimiter {} at byte {}",
                        event.delimiter,
                        event.start
                    );
                    continue;
                };
                let discarded = stack.len() - position - 1;
                if discarded > 0 {
                    log::debug!(
                        "Dropping {discarded} unclosed math delimiters before byte {}",
                        event.start
                    );
                }
                stack.truncate(position + 1);
                let Some(open) = stack.pop() else { continue };

                equations.push(Equation {
                    index: equations.len(),
                    start: open.start,
                    end: event.end,
                    content_start: open.content_start,
                    content_end: event.start,
                    content: tex[open.content_start..event.start].to_string(),
                    depth: stack.len(),
                    delimiter: open.delimiter,
                });
            }
        }

        if !stack.is_empty() {
            log::debug!("{} math delimiters left open at end of input", stack.len());
        }
        Ok(equations)
    }
}
