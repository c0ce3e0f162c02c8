//! Invocations of user-specified macros.

use super::EntityExtractor;
use crate::arguments::{parse_arguments, ArgumentSpan, MacroSignature};
use crate::scanner::{scan_tex, Pattern};
use serde::{Deserialize, Serialize};
use texloc_core::{LocatorError, Result};

/// A macro to look for, e.g. `{ name: "textbf", signature: "{}" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacroDefinition {
    /// Command name without the backslash
    pub name: String,
    pub signature: MacroSignature,
}

impl MacroDefinition {
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] if the signature does not parse.
    pub fn new(name: impl Into<String>, signature: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            signature: MacroSignature::parse(signature)?,
        })
    }
}

/// One invocation of a [`MacroDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacroInvocation {
    pub name: String,
    pub start: usize,
    /// End of the last parsed argument
    pub end: usize,
    /// One entry per signature slot
    pub arguments: Vec<Option<ArgumentSpan>>,
}

/// Finds invocations of a set of macros.
///
/// Invocations whose required arguments cannot be parsed are skipped.
#[derive(Debug, Clone)]
pub struct MacroExtractor {
    definitions: Vec<MacroDefinition>,
    patterns: Vec<Pattern>,
}

impl MacroExtractor {
    /// # Errors
    ///
    /// Returns [`LocatorError::ConfigError`] for an empty definition list or a
    /// name that is not a TeX control word.
    pub fn new(definitions: Vec<MacroDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(LocatorError::config("macro extractor needs at least one macro"));
        }
        if let Some(bad) = definitions
            .iter()
            .find(|d| d.name.is_empty() || !d.name.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(LocatorError::config(format!(
                "macro name '{}' must be ASCII letters only",
                bad.name
            )));
        }

        // One alternation, longest names first, so that a name that prefixes
        // another never collides with it at the same position.
        let mut names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let pattern = Pattern::unescaped("macro", &format!(r"\\(?:{})", names.join("|")))?;

        Ok(Self {
            definitions,
            patterns: vec![pattern],
        })
    }
}

impl EntityExtractor for MacroExtractor {
    type Entity = MacroInvocation;

    fn parse(&self, tex: &str) -> Result<Vec<MacroInvocation>> {
        let mut invocations = Vec::new();
        for found in scan_tex(tex, &self.patterns) {
            let found = found?;
            // `\foo` inside `\foobar` is a different control word
            if tex[found.end..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                continue;
            }
            let name = &found.text[1..];
            let Some(definition) = self.definitions.iter().find(|d| d.name == name) else {
                continue;
            };
            let Some(parsed) = parse_arguments(tex, found.end, &definition.signature) else {
                log::debug!("Skipping \\{name} at byte {}: arguments did not parse", found.start);
                continue;
            };
            invocations.push(MacroInvocation {
                name: name.to_string(),
                start: found.start,
                end: parsed.end,
                arguments: parsed.arguments,
            });
        }
        Ok(invocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> MacroExtractor {
        MacroExtractor::new(vec![
            MacroDefinition::new("term", "[]{}").unwrap(),
            MacroDefinition::new("termref", "{}").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_invocations_with_arguments() {
        let tex = r"A \term[plural]{graph} and \termref{graph}.";
        let invocations = extractor().parse(tex).unwrap();
        assert_eq!(invocations.len(), 2);

        assert_eq!(invocations[0].name, "term");
        assert_eq!(&tex[invocations[0].start..invocations[0].end], r"\term[plural]{graph}");
        let optional = invocations[0].arguments[0].unwrap();
        assert_eq!(optional.content(tex), "plural");

        assert_eq!(invocations[1].name, "termref");
        assert_eq!(invocations[1].arguments.len(), 1);
    }

    #[test]
    fn test_longer_control_words_are_not_matched() {
        let invocations = extractor().parse(r"\terms{x} \termrefs{y}").unwrap();
        assert!(invocations.is_empty());
    }

    #[test]
    fn test_missing_required_argument_skipped() {
        let invocations = extractor().parse(r"\term and \term{ok}").unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].start, 10);
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(MacroExtractor::new(vec![]).is_err());
        let bad = MacroDefinition::new("a1", "{}").unwrap();
        assert!(MacroExtractor::new(vec![bad]).is_err());
    }
}
