//! Entity extractors built on the scanner.
//!
//! | extractor                | finds                                                    |
//! |--------------------------|----------------------------------------------------------|
//! | [`EquationExtractor`]    | `$...$`, `$$...$$`, `\(...\)`, `\[...\]`, math environments |
//! | [`CitationExtractor`]    | `\cite`-family commands and their keys                   |
//! | [`BibitemExtractor`]     | `\bibitem` entries with plain text                       |
//! | [`MacroExtractor`]       | invocations of caller-specified macros                   |
//! | [`ColorLinksExtractor`]  | `colorlinks` options of `hyperref`                       |

pub mod bibitem;
pub mod citation;
pub mod colorlinks;
pub mod equation;
pub mod macros;
pub mod spans;

pub use bibitem::{clean_bibitem_text, Bibitem, BibitemExtractor};
pub use citation::{split_keys, Citation, CitationExtractor};
pub use colorlinks::{find_documentclass_end, ColorLinks, ColorLinksExtractor};
pub use equation::{Delimiter, Equation, EquationExtractor, MATH_ENVIRONMENTS};
pub use macros::{MacroDefinition, MacroExtractor, MacroInvocation};
pub use spans::{Symbol, Term};

use texloc_core::Result;

/// Extracts one kind of entity from a TeX file.
pub trait EntityExtractor {
    type Entity;

    /// All entities in `tex`, in document order of their closing position.
    ///
    /// # Errors
    ///
    /// Returns [`texloc_core::LocatorError::ParseAmbiguity`] if the
    /// extractor's grammar is ambiguous on this input.
    fn parse(&self, tex: &str) -> Result<Vec<Self::Entity>>;
}
