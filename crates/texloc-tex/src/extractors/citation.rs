//! Citation command extraction.

use super::EntityExtractor;
use crate::arguments::{parse_arguments, MacroSignature};
use crate::scanner::{scan_tex, Pattern};
use serde::{Deserialize, Serialize};
use texloc_core::Result;

/// Citation commands recognized, each optionally starred.
///
/// Longer names come first so that alternation prefers them.
pub const CITE_COMMANDS: &[&str] = &[
    "citeyearpar",
    "citeauthor",
    "Citeauthor",
    "parencite",
    "Parencite",
    "footcite",
    "textcite",
    "Textcite",
    "autocite",
    "Autocite",
    "citealp",
    "Citealp",
    "citealt",
    "Citealt",
    "citeyear",
    "citenum",
    "citep",
    "Citep",
    "citet",
    "Citet",
    "cite",
    "Cite",
];

/// A citation command and the keys it cites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub index: usize,
    /// Command name without the backslash, e.g. `citep`
    pub command: String,
    pub keys: Vec<String>,
    /// Start of the backslash
    pub start: usize,
    /// End of the closing brace of the key list
    pub end: usize,
}

impl Citation {
    #[must_use]
    pub fn id(&self) -> String {
        format!("citation-{}", self.index)
    }
}

/// Extracts `\cite`-family commands with up to two optional arguments.
///
/// `\nocite` does not render anything and is never reported.
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    patterns: Vec<Pattern>,
    signature: MacroSignature,
}

impl CitationExtractor {
    /// # Errors
    ///
    /// Returns an error only if the built-in patterns fail to compile.
    pub fn new() -> Result<Self> {
        let commands = CITE_COMMANDS.join("|");
        Ok(Self {
            patterns: vec![Pattern::unescaped(
                "citation",
                &format!(r"\\(?:{commands})\b\*?"),
            )?],
            signature: MacroSignature::parse("[][]{}")?,
        })
    }
}

/// Split a key list on commas, dropping blanks.
#[must_use]
pub fn split_keys(keys: &str) -> Vec<String> {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

impl EntityExtractor for CitationExtractor {
    type Entity = Citation;

    fn parse(&self, tex: &str) -> Result<Vec<Citation>> {
        let mut citations = Vec::new();
        for found in scan_tex(tex, &self.patterns) {
            let found = found?;
            let Some(arguments) = parse_arguments(tex, found.end, &self.signature) else {
                log::debug!("Skipping {} at byte {}: no key argument", found.text, found.start);
                continue;
            };
            let keys = arguments
                .required(0)
                .map(|arg| split_keys(arg.content(tex)))
                .unwrap_or_default();
            if keys.is_empty() {
                log::debug!("Skipping {} at byte {}: empty key list", found.text, found.start);
                continue;
            }

            citations.push(Citation {
                index: citations.len(),
                command: found.text.trim_start_matches('\\').trim_end_matches('*').to_string(),
                keys,
                start: found.start,
                end: arguments.end,
            });
        }
        Ok(citations)
    }
}
