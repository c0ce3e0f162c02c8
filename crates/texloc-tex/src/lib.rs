//! # texloc-tex
//!
//! TeX-side half of entity location: find entities in raw TeX and inject the
//! hue markers that make them visible in rendered pages.
//!
//! - [`scanner`]: left-to-right pattern scanner that skips `%` comments
//! - [`arguments`]: balanced `[...]` and `{...}` argument parsing
//! - [`extractors`]: equations, citations, bibliography entries, macros and
//!   `hyperref` settings
//! - [`colorize`]: batches entities into hue iterations and splices markers

pub mod arguments;
pub mod colorize;
pub mod extractors;
pub mod scanner;

pub use arguments::{parse_arguments, ArgumentKind, ArgumentSpan, MacroSignature, ParsedArguments};
pub use colorize::{
    colorize, last_colorized_entity, strip_markers, Colorizable, ColorizeIter, ColorizeOptions,
    ColorizedIteration, COLORIZED_ENTITY_PREFIX, COLOR_PREAMBLE, DRIVER_NOT_IMPLEMENTED,
};
pub use extractors::{
    Bibitem, BibitemExtractor, Citation, CitationExtractor, ColorLinks, ColorLinksExtractor,
    Delimiter, EntityExtractor, Equation, EquationExtractor, MacroDefinition, MacroExtractor,
    MacroInvocation, Symbol, Term,
};
pub use scanner::{scan_tex, Match, Pattern, Scanner};
