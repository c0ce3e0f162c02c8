//! Bibliography entry extraction.

use super::EntityExtractor;
use crate::arguments::{parse_arguments, MacroSignature};
use crate::scanner::{scan_tex, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use texloc_core::Result;

static RE_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\([&%$#_{}])|\\[a-zA-Z]+\*?|[{}~]").expect("valid markup regex")
});
static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One `\bibitem` with its plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bibitem {
    pub key: String,
    /// Optional label, e.g. `[Smith, 2019]`
    pub label: Option<String>,
    /// Entry text with TeX markup removed
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Extracts `\bibitem[label]{key}` entries.
///
/// An entry's text runs to the next `\bibitem` or `\end{thebibliography}`.
#[derive(Debug, Clone)]
pub struct BibitemExtractor {
    patterns: Vec<Pattern>,
    signature: MacroSignature,
}

impl BibitemExtractor {
    /// # Errors
    ///
    /// Returns an error only if the built-in patterns fail to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: vec![
                Pattern::unescaped("bibitem", r"\\bibitem\b")?,
                Pattern::unescaped("end_bibliography", r"\\end\s*\{thebibliography\}")?,
            ],
            signature: MacroSignature::parse("[]{}")?,
        })
    }
}

/// Reduce a bibliography entry's TeX to plain text.
///
/// Escaped characters are kept, commands and `~` become spaces, braces are
/// dropped and whitespace is collapsed.
#[must_use]
pub fn clean_bibitem_text(tex: &str) -> String {
    let text = RE_MARKUP.replace_all(tex, |caps: &regex::Captures<'_>| {
        if let Some(escaped) = caps.get(1) {
            return escaped.as_str().to_string();
        }
        match &caps[0] {
            "{" | "}" => String::new(),
            _ => " ".to_string(),
        }
    });
    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}

struct OpenEntry {
    start: usize,
    key: String,
    label: Option<String>,
    text_start: usize,
}

impl OpenEntry {
    fn close(self, tex: &str, end: usize) -> Bibitem {
        Bibitem {
            key: self.key,
            label: self.label,
            text: clean_bibitem_text(&tex[self.text_start..end]),
            start: self.start,
            end,
        }
    }
}

impl EntityExtractor for BibitemExtractor {
    type Entity = Bibitem;

    fn parse(&self, tex: &str) -> Result<Vec<Bibitem>> {
        let mut bibitems = Vec::new();
        let mut open: Option<OpenEntry> = None;

        for found in scan_tex(tex, &self.patterns) {
            let found = found?;
            if let Some(entry) = open.take() {
                bibitems.push(entry.close(tex, found.start));
            }
            if found.pattern != "bibitem" {
                continue;
            }

            let Some(arguments) = parse_arguments(tex, found.end, &self.signature) else {
                log::warn!("Skipping \\bibitem at byte {} without a key", found.start);
                continue;
            };
            let key = arguments
                .required(0)
                .map(|arg| arg.content(tex).trim().to_string())
                .unwrap_or_default();
            open = Some(OpenEntry {
                start: found.start,
                key,
                label: arguments.optional(0).map(|arg| arg.content(tex).to_string()),
                text_start: arguments.end,
            });
        }

        if let Some(entry) = open {
            bibitems.push(entry.close(tex, tex.len()));
        }
        Ok(bibitems)
    }
}
