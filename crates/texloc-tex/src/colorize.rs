//! Hue colorization of entity spans.
//!
//! [`colorize`] wraps each entity's span in a pair of invisible color markers
//! and batches entities into iterations of at most `H` (palette size) entities,
//! each with a distinct hue. After compiling and rendering an iteration, the
//! location of every entity can be read back from the colored pixels.
//!
//! The markers are `\texlocsetcolor{r g b}{<entity id>}` before the span and
//! `\texlocrevertcolor{}` after it. Both take braced arguments so they never
//! swallow the space that follows them, and they push and pop the pdfTeX color
//! stack so they add no glue and do not reflow the page. The macros are defined
//! by [`COLOR_PREAMBLE`], inserted after `\documentclass`.
//!
//! ```
//! use texloc_tex::colorize::{colorize, strip_markers, ColorizeOptions};
//! use texloc_tex::extractors::{CitationExtractor, EntityExtractor};
//!
//! # fn main() -> texloc_core::Result<()> {
//! let tex = r"word.~\cite{source1,source2}";
//! let citations = CitationExtractor::new()?.parse(tex)?;
//! let iterations: Vec<_> = colorize(tex, &citations, &ColorizeOptions::default())?.collect();
//!
//! assert_eq!(iterations.len(), 1);
//! assert_eq!(iterations[0].hues[0].1.keys, ["source1", "source2"]);
//! assert_eq!(strip_markers(&iterations[0].tex), tex);
//! # Ok(())
//! # }
//! ```

use crate::extractors::{
    find_documentclass_end, Citation, ColorLinksExtractor, EntityExtractor, Equation, Symbol, Term,
};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use texloc_core::{
    Hue, HueCycle, HueRecord, LocatorConfig, LocatorError, Result, DEFAULT_NUM_HUES,
};

/// Printed by the preamble when the TeX engine has no color stack.
pub const DRIVER_NOT_IMPLEMENTED: &str = "driver not implemented";

/// Prefix of the log line each start marker writes.
pub const COLORIZED_ENTITY_PREFIX: &str = "Colorized entity '";

/// Definitions of the marker macros.
pub const COLOR_PREAMBLE: &str = r"
\makeatletter
\ifdefined\texlocsetcolor\else
\ifdefined\pdfcolorstackinit
\chardef\texloc@colorstack=\pdfcolorstackinit page direct{0 g 0 G}\relax
\def\texlocsetcolor#1#2{\pdfcolorstack\texloc@colorstack push{#1 rg #1 RG}\typeout{Colorized entity '#2'}}
\def\texlocrevertcolor#1{\pdfcolorstack\texloc@colorstack pop\relax}
\else
\typeout{driver not implemented}
\def\texlocsetcolor#1#2{}
\def\texlocrevertcolor#1{}
\fi
\fi
\makeatother
";

const END_MARKER: &str = r"\texlocrevertcolor{}";
const DISABLED_COLORLINKS: &str = "colorlinks=false";

static RE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\texlocsetcolor\{[^{}]*\}\{[^{}]*\}|\\texlocrevertcolor\{\}")
        .expect("valid marker regex")
});

/// An entity the colorizer can wrap in markers.
pub trait Colorizable {
    /// Identifier written into the marker and the hue records.
    fn entity_id(&self) -> String;

    /// Byte range to color, `None` when the entity has no usable range.
    fn char_range(&self) -> Option<Range<usize>>;
}

impl Colorizable for Equation {
    fn entity_id(&self) -> String {
        self.id()
    }

    fn char_range(&self) -> Option<Range<usize>> {
        Some(self.start..self.end)
    }
}

impl Colorizable for Citation {
    fn entity_id(&self) -> String {
        self.id()
    }

    fn char_range(&self) -> Option<Range<usize>> {
        Some(self.start..self.end)
    }
}

impl Colorizable for Symbol {
    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn char_range(&self) -> Option<Range<usize>> {
        self.span()
    }
}

impl Colorizable for Term {
    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn char_range(&self) -> Option<Range<usize>> {
        Some(self.start..self.end)
    }
}

/// How entities are batched into iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorizeOptions {
    /// Entities per iteration; `None` uses every hue of the palette
    pub batch_size: Option<usize>,
    pub num_hues: usize,
}

impl Default for ColorizeOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            num_hues: DEFAULT_NUM_HUES,
        }
    }
}

impl From<&LocatorConfig> for ColorizeOptions {
    fn from(config: &LocatorConfig) -> Self {
        Self {
            batch_size: config.batch_size(),
            num_hues: config.num_hues,
        }
    }
}

impl ColorizeOptions {
    fn palette_size(&self) -> usize {
        self.num_hues.max(1)
    }

    fn per_iteration(&self) -> usize {
        let hues = self.palette_size();
        self.batch_size.map_or(hues, |size| size.clamp(1, hues))
    }
}

/// One colorized version of the TeX file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorizedIteration<E> {
    pub index: usize,
    pub tex: String,
    /// Hue given to each colorized entity, pairwise distinct
    pub hues: Vec<(Hue, E)>,
}

impl<E: Colorizable> ColorizedIteration<E> {
    /// Hue records to persist for this iteration.
    #[must_use]
    pub fn records(&self, tex_path: &str) -> Vec<HueRecord> {
        self.hues
            .iter()
            .map(|(hue, entity)| HueRecord {
                tex_path: tex_path.to_string(),
                iteration: self.index,
                hue: *hue,
                entity_id: entity.entity_id(),
            })
            .collect()
    }
}

/// A replacement applied to every iteration before markers go in.
struct Edit {
    range: Range<usize>,
    replacement: String,
}

impl Edit {
    /// Whether the edit touches the inside of `span`.
    fn overlaps(&self, span: &Range<usize>) -> bool {
        if self.range.is_empty() {
            span.start < self.range.start && self.range.start < span.end
        } else {
            self.range.start < span.end && span.start < self.range.end
        }
    }
}

fn shift(edits: &[Edit], applies: impl Fn(&Edit) -> bool) -> isize {
    edits
        .iter()
        .filter(|&edit| applies(edit))
        .map(|edit| edit.replacement.len() as isize - edit.range.len() as isize)
        .sum()
}

/// Position of `span` after applying `edits`.
///
/// An insertion at an entity's start lands before the entity, one at its end
/// lands after it.
fn remap(edits: &[Edit], span: &Range<usize>) -> Range<usize> {
    let start_shift = shift(edits, |edit| edit.range.end <= span.start);
    let end_shift = shift(edits, |edit| edit.range.start < span.end);
    span.start.saturating_add_signed(start_shift)..span.end.saturating_add_signed(end_shift)
}

fn apply_edits(tex: &str, edits: &[Edit]) -> String {
    let extra: usize = edits.iter().map(|edit| edit.replacement.len()).sum();
    let mut out = String::with_capacity(tex.len() + extra);
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&tex[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&tex[cursor..]);
    out
}

fn start_marker(hue: Hue, entity_id: &str) -> String {
    let [r, g, b] = hue.to_rgb();
    format!(r"\texlocsetcolor{{{r:.4} {g:.4} {b:.4}}}{{{entity_id}}}")
}

/// Why a span cannot be colorized, if it cannot.
fn span_problem(
    tex: &str,
    entity_id: &str,
    span: Option<&Range<usize>>,
    edits: &[Edit],
) -> Option<&'static str> {
    let Some(span) = span else {
        return Some("no character range");
    };
    if entity_id.is_empty() || entity_id.contains(['{', '}', '%', '#', '\\']) {
        return Some("entity id cannot be written into TeX");
    }
    if span.is_empty() {
        return Some("empty range");
    }
    if span.end > tex.len() {
        return Some("range past the end of the file");
    }
    if !tex.is_char_boundary(span.start) || !tex.is_char_boundary(span.end) {
        return Some("range splits a character");
    }
    if edits.iter().any(|edit| edit.overlaps(span)) {
        return Some("range overlaps a hyperref setting or the preamble");
    }
    None
}

/// Lazy sequence of [`ColorizedIteration`]s. See [`colorize`].
pub struct ColorizeIter<E> {
    base: String,
    /// Remapped spans still to colorize, highest start first
    pending: Vec<(Range<usize>, E)>,
    options: ColorizeOptions,
    next_index: usize,
}

/// Colorize `entities` in `tex`, yielding one iteration per batch of hues.
///
/// Before markers go in, every `colorlinks` option of `hyperref` is rewritten
/// to `colorlinks=false` and [`COLOR_PREAMBLE`] is inserted after
/// `\documentclass` (or at the start of the file when there is none). Entities
/// whose span cannot be used are skipped with a warning. An entity overlapping
/// one already colored in the current iteration waits for a later iteration.
///
/// # Errors
///
/// Returns an error if scanning the file for `hyperref` settings fails.
pub fn colorize<E: Colorizable + Clone>(
    tex: &str,
    entities: &[E],
    options: &ColorizeOptions,
) -> Result<ColorizeIter<E>> {
    let mut edits: Vec<Edit> = ColorLinksExtractor::new()?
        .parse(tex)?
        .into_iter()
        .map(|setting| Edit {
            range: setting.start..setting.end,
            replacement: DISABLED_COLORLINKS.to_string(),
        })
        .collect();
    let preamble_at = find_documentclass_end(tex)?.unwrap_or(0);
    edits.push(Edit {
        range: preamble_at..preamble_at,
        replacement: COLOR_PREAMBLE.to_string(),
    });
    edits.sort_by_key(|edit| edit.range.start);

    let mut pending = Vec::with_capacity(entities.len());
    for entity in entities {
        let entity_id = entity.entity_id();
        let span = entity.char_range();
        if let Some(reason) = span_problem(tex, &entity_id, span.as_ref(), &edits) {
            let err = LocatorError::UnresolvableSpan {
                entity_id,
                reason: reason.to_string(),
            };
            log::warn!("Skipping entity: {err}");
            continue;
        }
        if let Some(span) = span {
            pending.push((remap(&edits, &span), entity.clone()));
        }
    }
    pending.sort_by(|a, b| b.0.start.cmp(&a.0.start).then_with(|| b.0.end.cmp(&a.0.end)));

    log::debug!(
        "Colorizing {} of {} entities, {} per iteration",
        pending.len(),
        entities.len(),
        options.per_iteration()
    );
    Ok(ColorizeIter {
        base: apply_edits(tex, &edits),
        pending,
        options: *options,
        next_index: 0,
    })
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

impl<E: Colorizable> Iterator for ColorizeIter<E> {
    type Item = ColorizedIteration<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() {
            return None;
        }

        let limit = self.options.per_iteration();
        let mut hues = HueCycle::new(self.options.palette_size());
        let mut chosen: Vec<(Hue, Range<usize>, E)> = Vec::with_capacity(limit);
        let mut deferred = Vec::new();

        for (span, entity) in std::mem::take(&mut self.pending) {
            if chosen.len() >= limit || chosen.iter().any(|(_, other, _)| overlaps(other, &span)) {
                deferred.push((span, entity));
                continue;
            }
            match hues.next() {
                Some(hue) => chosen.push((hue, span, entity)),
                None => deferred.push((span, entity)),
            }
        }
        self.pending = deferred;

        // Chosen spans are disjoint and sorted by descending start, so each
        // insertion leaves the offsets of the remaining spans intact.
        let mut tex = self.base.clone();
        for (hue, span, entity) in &chosen {
            tex.insert_str(span.end, END_MARKER);
            tex.insert_str(span.start, &start_marker(*hue, &entity.entity_id()));
        }

        let index = self.next_index;
        self.next_index += 1;
        log::debug!(
            "Iteration {index}: colorized {} entities, {} left",
            chosen.len(),
            self.pending.len()
        );
        Some(ColorizedIteration {
            index,
            tex,
            hues: chosen
                .into_iter()
                .map(|(hue, _, entity)| (hue, entity))
                .collect(),
        })
    }
}

/// Remove the preamble and every marker the colorizer inserted.
///
/// Rewritten `colorlinks` options are left as `colorlinks=false`.
#[must_use]
pub fn strip_markers(tex: &str) -> String {
    let without_preamble = tex.replacen(COLOR_PREAMBLE, "", 1);
    RE_MARKER.replace_all(&without_preamble, "").into_owned()
}

/// Id of the last entity whose start marker appears in a compiler log.
///
/// When compilation fails, this is the entity being typeset at the time.
#[must_use]
pub fn last_colorized_entity(stdout: &str) -> Option<&str> {
    let start = stdout.rfind(COLORIZED_ENTITY_PREFIX)? + COLORIZED_ENTITY_PREFIX.len();
    let len = stdout[start..].find('\'')?;
    Some(&stdout[start..start + len])
}
