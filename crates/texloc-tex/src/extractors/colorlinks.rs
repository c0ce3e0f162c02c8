//! Hyperlink coloring settings and the document class declaration.
//!
//! `hyperref` with `colorlinks` paints link text, which would hide the hue
//! markers, so the colorizer has to find and disable those settings. It also
//! needs to know where `\documentclass` ends to insert its own preamble.

use super::EntityExtractor;
use crate::arguments::{parse_arguments, MacroSignature};
use crate::scanner::{scan_tex, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use texloc_core::Result;

static RE_COLORLINKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcolorlinks\b(?:\s*=\s*\{?[A-Za-z]*\}?)?").expect("valid colorlinks regex")
});

/// A `colorlinks` option, as a span over the whole `colorlinks[=value]` text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorLinks {
    pub start: usize,
    pub end: usize,
    /// Assigned value, `None` for a bare `colorlinks`
    pub value: Option<String>,
}

/// Finds `colorlinks` inside `\hypersetup{...}` and `\usepackage[...]{hyperref}`.
#[derive(Debug, Clone)]
pub struct ColorLinksExtractor {
    patterns: Vec<Pattern>,
    hypersetup: MacroSignature,
    usepackage: MacroSignature,
}

impl ColorLinksExtractor {
    /// # Errors
    ///
    /// Returns an error only if the built-in patterns fail to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: vec![
                Pattern::unescaped("hypersetup", r"\\hypersetup\b")?,
                Pattern::unescaped("usepackage", r"\\usepackage\b")?,
            ],
            hypersetup: MacroSignature::parse("{}")?,
            usepackage: MacroSignature::parse("[]{}")?,
        })
    }
}

fn settings_in(offset: usize, options: &str) -> impl Iterator<Item = ColorLinks> + '_ {
    RE_COLORLINKS.find_iter(options).map(move |found| {
        let value = found
            .as_str()
            .split_once('=')
            .map(|(_, v)| v.trim().trim_matches(|c: char| c == '{' || c == '}').to_string());
        ColorLinks {
            start: offset + found.start(),
            end: offset + found.end(),
            value,
        }
    })
}

impl EntityExtractor for ColorLinksExtractor {
    type Entity = ColorLinks;

    fn parse(&self, tex: &str) -> Result<Vec<ColorLinks>> {
        let mut settings = Vec::new();
        for found in scan_tex(tex, &self.patterns) {
            let found = found?;
            let options = if found.pattern == "hypersetup" {
                parse_arguments(tex, found.end, &self.hypersetup)
                    .and_then(|parsed| parsed.required(0).copied())
            } else {
                parse_arguments(tex, found.end, &self.usepackage).and_then(|parsed| {
                    let loads_hyperref = parsed.required(0).is_some_and(|packages| {
                        packages.content(tex).split(',').any(|p| p.trim() == "hyperref")
                    });
                    parsed.optional(0).copied().filter(|_| loads_hyperref)
                })
            };
            if let Some(options) = options {
                settings.extend(settings_in(options.content_start, options.content(tex)));
            }
        }
        Ok(settings)
    }
}

/// Byte offset just past the `\documentclass[...]{...}` declaration, if any.
///
/// # Errors
///
/// Returns an error only if the built-in pattern fails to compile.
pub fn find_documentclass_end(tex: &str) -> Result<Option<usize>> {
    let patterns = [Pattern::unescaped("documentclass", r"\\documentclass\b")?];
    let signature = MacroSignature::parse("[]{}")?;
    for found in scan_tex(tex, &patterns) {
        let found = found?;
        if let Some(parsed) = parse_arguments(tex, found.end, &signature) {
            return Ok(Some(parsed.end));
        }
    }
    Ok(None)
}
