//! External tools the iteration runner drives.
//!
//! Compiling TeX and rasterizing PDFs happen outside this crate. Callers plug
//! in their own implementations (a `latexmk` wrapper, a pdfium renderer, ...);
//! tests plug in fakes.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use texloc_core::Result;

/// What a compiler run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationResult {
    pub success: bool,
    /// TeX files the compiler processed
    pub compiled_files: Vec<PathBuf>,
    /// Files written by the compiler (PDF, PostScript, ...), main output first
    pub output_files: Vec<PathBuf>,
    pub stdout: String,
    pub stderr: String,
}

impl CompilationResult {
    /// Main output file, if the compiler wrote any.
    #[inline]
    #[must_use]
    pub fn main_output(&self) -> Option<&Path> {
        self.output_files.first().map(PathBuf::as_path)
    }
}

/// Compiles the TeX sources in a directory.
pub trait Compiler {
    /// Compile the sources in `dir`. A failed compilation is reported through
    /// [`CompilationResult::success`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the compiler could not be run at all.
    fn compile(&self, dir: &Path) -> Result<CompilationResult>;
}

/// Renders a compiled document to one image per page.
pub trait Rasterizer {
    /// # Errors
    ///
    /// Returns an error if the file cannot be rendered.
    fn raster(&self, file: &Path) -> Result<Vec<RgbImage>>;
}

/// Computes the difference of a baseline page and a colorized page.
pub trait ImageDiffer {
    /// # Errors
    ///
    /// Returns an error if the images cannot be compared.
    fn diff(&self, baseline: &RgbImage, colorized: &RgbImage) -> Result<RgbImage>;
}

/// [`ImageDiffer`] over [`texloc_raster::diff_images`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelDiffer;

impl ImageDiffer for PixelDiffer {
    fn diff(&self, baseline: &RgbImage, colorized: &RgbImage) -> Result<RgbImage> {
        texloc_raster::diff_images(baseline, colorized)
    }
}

/// [`Rasterizer`] for documents already rendered to page images.
///
/// Page images are looked up next to the compiled file as
/// `<stem>-page-<n>.png`, numbered from 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageImageRasterizer;

impl Rasterizer for PageImageRasterizer {
    fn raster(&self, file: &Path) -> Result<Vec<RgbImage>> {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut pages = Vec::new();
        for number in 1.. {
            let path = dir.join(format!("{stem}-page-{number}.png"));
            if !path.exists() {
                break;
            }
            pages.push(texloc_raster::load_rgb(&path)?);
        }
        log::debug!("Loaded {} page images for {}", pages.len(), file.display());
        Ok(pages)
    }
}
