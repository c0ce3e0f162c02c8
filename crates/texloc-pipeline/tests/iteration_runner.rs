//! End-to-end runs of the iteration loop over fake collaborators.
//!
//! The fake compiler copies `main.tex` to `main.pdf`; the fake rasterizer
//! draws one 5x5 block per known entity on a 40x20 page, black unless the
//! file carries a start marker for it, plus a black line of body text.

use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use texloc_core::{
    read_records, EntityLocationRecord, HueLocationRecord, HueRecord, LocatorConfig,
    LocatorConfigBuilder, Result,
};
use texloc_pipeline::{
    run_command, CompilationResult, Compiler, IterationRunner, LocateEntities, PaperSource,
    PixelDiffer, Rasterizer, COMPILE_ERRORS_FILE, ENTITY_LOCATIONS_FILE, HUES_FILE,
    HUE_LOCATIONS_FILE,
};
use texloc_tex::{CitationExtractor, Term};

const PAPER_ID: &str = "2101.00001";
const TEX: &str = "\\documentclass{article}\n\\begin{document}\nAlpha beta gamma.\n\\end{document}\n";
const MARKER: &str = r"\texlocsetcolor{";

/// Entity ids with a start marker in `tex`, with their marker color.
fn colored_entities(tex: &str) -> Vec<(String, [u8; 3])> {
    let mut found = Vec::new();
    let mut rest = tex;
    while let Some(at) = rest.find(MARKER) {
        rest = &rest[at + MARKER.len()..];
        let Some(close) = rest.find('}') else { break };
        let channels: Vec<f64> = rest[..close]
            .split_whitespace()
            .filter_map(|v| v.parse().ok())
            .collect();
        let after = &rest[close + 1..];
        let Some(id_end) = after.find('}') else { break };
        if channels.len() == 3 && after.starts_with('{') {
            let rgb = [0, 1, 2].map(|i| (channels[i] * 255.0).round() as u8);
            found.push((after[1..id_end].to_string(), rgb));
        }
    }
    found
}

#[derive(Default)]
struct FakeCompiler {
    /// Fail whenever this entity is colorized
    fail_on: Option<&'static str>,
    /// Report a missing color driver whenever markers are present
    no_driver: bool,
    /// Fail every compilation, including the baseline
    broken: bool,
}

impl Compiler for FakeCompiler {
    fn compile(&self, dir: &Path) -> Result<CompilationResult> {
        let tex_file = dir.join("main.tex");
        let tex = fs::read_to_string(&tex_file)?;
        let colored = colored_entities(&tex);

        let mut stdout = String::new();
        for (id, _) in &colored {
            stdout.push_str(&format!("Colorized entity '{id}'\n"));
        }
        if self.no_driver && !colored.is_empty() {
            stdout.push_str("driver not implemented\n");
        }

        let fails = self.broken
            || self
                .fail_on
                .is_some_and(|id| colored.iter().any(|(c, _)| c == id));
        if fails {
            stdout.push_str("! Undefined control sequence.\n");
            return Ok(CompilationResult {
                success: false,
                compiled_files: vec![tex_file],
                stdout,
                ..CompilationResult::default()
            });
        }

        let pdf = dir.join("main.pdf");
        fs::write(&pdf, &tex)?;
        Ok(CompilationResult {
            success: true,
            compiled_files: vec![tex_file],
            output_files: vec![pdf],
            stdout,
            stderr: String::new(),
        })
    }
}

struct FakeRasterizer {
    ids: Vec<&'static str>,
    /// Push everything down 3 pixels whenever this entity is colorized
    shift_on: Option<&'static str>,
}

impl FakeRasterizer {
    fn new(ids: &[&'static str]) -> Self {
        Self {
            ids: ids.to_vec(),
            shift_on: None,
        }
    }
}

impl Rasterizer for FakeRasterizer {
    fn raster(&self, file: &Path) -> Result<Vec<RgbImage>> {
        let tex = fs::read_to_string(file)?;
        let colored = colored_entities(&tex);
        let dy = match self.shift_on {
            Some(id) if colored.iter().any(|(c, _)| c == id) => 3,
            _ => 0,
        };

        let mut page = RgbImage::from_pixel(40, 20, Rgb([255, 255, 255]));
        for (i, id) in self.ids.iter().enumerate() {
            let color = colored
                .iter()
                .find(|(c, _)| c == id)
                .map_or([0, 0, 0], |(_, rgb)| *rgb);
            let left = 2 + 10 * i as u32;
            for x in left..left + 5 {
                for y in 5 + dy..10 + dy {
                    page.put_pixel(x, y, Rgb(color));
                }
            }
        }
        for x in 2..31 {
            for y in 14 + dy..17 + dy {
                page.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        Ok(vec![page])
    }
}

struct Fixture {
    _sources: TempDir,
    output: TempDir,
    paper: PaperSource,
}

impl Fixture {
    fn new(tex: &str) -> Self {
        let sources = tempfile::tempdir().unwrap();
        fs::write(sources.path().join("main.tex"), tex).unwrap();
        let paper = PaperSource {
            paper_id: PAPER_ID.to_string(),
            source_dir: sources.path().to_path_buf(),
            tex_path: "main.tex".to_string(),
        };
        Self {
            _sources: sources,
            output: tempfile::tempdir().unwrap(),
            paper,
        }
    }

    fn paper_file(&self, name: &str) -> std::path::PathBuf {
        self.output.path().join(PAPER_ID).join(name)
    }
}

fn terms() -> Vec<Term> {
    ["Alpha", "beta", "gamma"]
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let start = TEX.find(word).unwrap();
            Term {
                id: format!("term-{i}"),
                start,
                end: start + word.len(),
            }
        })
        .collect()
}

const TERM_IDS: [&str; 3] = ["term-0", "term-1", "term-2"];

fn locate(
    compiler: &FakeCompiler,
    rasterizer: &FakeRasterizer,
    config: &LocatorConfig,
    fixture: &Fixture,
) -> Option<texloc_pipeline::PaperReport> {
    let runner = IterationRunner::new(compiler, rasterizer, &PixelDiffer, config, fixture.output.path());
    runner.locate(&fixture.paper, TEX, &terms()).unwrap()
}

#[test]
fn test_all_entities_located_in_one_iteration() {
    let fixture = Fixture::new(TEX);
    let report = locate(
        &FakeCompiler::default(),
        &FakeRasterizer::new(&TERM_IDS),
        &LocatorConfig::default(),
        &fixture,
    )
    .unwrap();

    assert_eq!(report.iterations, 1);
    assert_eq!(report.discarded_iterations, 0);
    assert_eq!(report.colorized, 3);
    assert_eq!(report.located, 3);
    assert_eq!(report.boxes, 3);

    let hues: Vec<HueRecord> = read_records(fixture.paper_file(HUES_FILE)).unwrap();
    assert_eq!(hues.len(), 3);

    let locations: Vec<HueLocationRecord> =
        read_records(fixture.paper_file(HUE_LOCATIONS_FILE)).unwrap();
    let beta = locations.iter().find(|r| r.entity_id == "term-1").unwrap();
    assert_eq!(beta.page, 0);
    assert!((beta.left - 12.0 / 40.0).abs() < 1e-9);
    assert!((beta.top - 5.0 / 20.0).abs() < 1e-9);
    assert!((beta.width - 5.0 / 40.0).abs() < 1e-9);
    assert_eq!(
        hues.iter().find(|h| h.entity_id == "term-1").map(|h| h.hue),
        Some(beta.hue)
    );

    assert_eq!(report.appearances, 3);
    let appearances: Vec<EntityLocationRecord> =
        read_records(fixture.paper_file(ENTITY_LOCATIONS_FILE)).unwrap();
    let beta_appearance = appearances.iter().find(|r| r.entity_id == "term-1").unwrap();
    assert_eq!(beta_appearance.appearance, 0);
    assert_eq!(beta_appearance.bounding_box(), beta.bounding_box());
}

#[test]
fn test_rerun_replaces_records() {
    let fixture = Fixture::new(TEX);
    let config = LocatorConfigBuilder::new()
        .one_entity_at_a_time(true)
        .build()
        .unwrap();
    let failing = FakeCompiler {
        fail_on: Some("term-1"),
        ..FakeCompiler::default()
    };
    locate(&failing, &FakeRasterizer::new(&TERM_IDS), &config, &fixture).unwrap();
    assert!(fixture.paper_file(COMPILE_ERRORS_FILE).exists());

    for _ in 0..2 {
        locate(
            &FakeCompiler::default(),
            &FakeRasterizer::new(&TERM_IDS),
            &LocatorConfig::default(),
            &fixture,
        )
        .unwrap();
    }

    let hues: Vec<HueRecord> = read_records(fixture.paper_file(HUES_FILE)).unwrap();
    let locations: Vec<HueLocationRecord> =
        read_records(fixture.paper_file(HUE_LOCATIONS_FILE)).unwrap();
    let appearances: Vec<EntityLocationRecord> =
        read_records(fixture.paper_file(ENTITY_LOCATIONS_FILE)).unwrap();
    assert_eq!(hues.len(), 3);
    assert_eq!(locations.len(), 3);
    assert_eq!(appearances.len(), 3);
    assert!(!fixture.paper_file(COMPILE_ERRORS_FILE).exists());
}

#[test]
fn test_compile_failure_discards_only_its_iteration() {
    let fixture = Fixture::new(TEX);
    let config = LocatorConfigBuilder::new()
        .one_entity_at_a_time(true)
        .build()
        .unwrap();
    let compiler = FakeCompiler {
        fail_on: Some("term-1"),
        ..FakeCompiler::default()
    };
    let report = locate(&compiler, &FakeRasterizer::new(&TERM_IDS), &config, &fixture).unwrap();

    assert_eq!(report.iterations, 3);
    assert_eq!(report.discarded_iterations, 1);
    assert_eq!(report.located, 2);

    let errors = fs::read_to_string(fixture.paper_file(COMPILE_ERRORS_FILE)).unwrap();
    assert_eq!(errors.lines().count(), 1);
    assert!(errors.contains("offending entity 'term-1'"));

    let locations: Vec<HueLocationRecord> =
        read_records(fixture.paper_file(HUE_LOCATIONS_FILE)).unwrap();
    assert!(locations.iter().all(|r| r.entity_id != "term-1"));
    assert!(fixture.paper_file("iteration-2").is_dir());
}

#[test]
fn test_layout_shift_discards_iteration_unless_skipped() {
    let fixture = Fixture::new(TEX);
    let rasterizer = FakeRasterizer {
        shift_on: Some("term-0"),
        ..FakeRasterizer::new(&TERM_IDS)
    };
    let report = locate(
        &FakeCompiler::default(),
        &rasterizer,
        &LocatorConfig::default(),
        &fixture,
    )
    .unwrap();
    assert_eq!(report.discarded_iterations, 1);
    assert_eq!(report.located, 0);
    assert!(!fixture.paper_file(HUE_LOCATIONS_FILE).exists());

    let skipping = LocatorConfigBuilder::new()
        .skip_visual_validation(true)
        .build()
        .unwrap();
    let fixture = Fixture::new(TEX);
    let report = locate(&FakeCompiler::default(), &rasterizer, &skipping, &fixture).unwrap();
    assert_eq!(report.discarded_iterations, 0);
    assert_eq!(report.located, 3);
}

#[test]
fn test_missing_driver_and_broken_sources() {
    let fixture = Fixture::new(TEX);
    let compiler = FakeCompiler {
        no_driver: true,
        ..FakeCompiler::default()
    };
    let report = locate(
        &compiler,
        &FakeRasterizer::new(&TERM_IDS),
        &LocatorConfig::default(),
        &fixture,
    )
    .unwrap();
    assert_eq!(report.discarded_iterations, report.iterations);
    assert!(!fixture.paper_file(COMPILE_ERRORS_FILE).exists());
    assert!(!fixture.paper_file(HUE_LOCATIONS_FILE).exists());

    let broken = FakeCompiler {
        broken: true,
        ..FakeCompiler::default()
    };
    let fixture = Fixture::new(TEX);
    assert!(locate(
        &broken,
        &FakeRasterizer::new(&TERM_IDS),
        &LocatorConfig::default(),
        &fixture
    )
    .is_none());
}

#[test]
fn test_rerun_cleans_iteration_dirs() {
    let fixture = Fixture::new(TEX);
    let stale = fixture.output.path().join(PAPER_ID).join("iteration-0/stale.aux");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "old").unwrap();

    locate(
        &FakeCompiler::default(),
        &FakeRasterizer::new(&TERM_IDS),
        &LocatorConfig::default(),
        &fixture,
    )
    .unwrap();
    assert!(!stale.exists());
    assert!(fixture.paper_file("iteration-0/main.pdf").exists());
}

#[test]
fn test_locate_command_over_papers() {
    let tex = "\\documentclass{article}\n\\begin{document}\nSee \\cite{knuth} and \\citep{lamport}.\n\\end{document}\n";
    let fixture = Fixture::new(tex);
    let missing = PaperSource {
        paper_id: "hep-th/9901001".to_string(),
        source_dir: fixture.output.path().join("nowhere"),
        tex_path: "main.tex".to_string(),
    };

    let compiler = FakeCompiler::default();
    let rasterizer = FakeRasterizer::new(&["citation-0", "citation-1"]);
    let config = LocatorConfig::default();
    let output = tempfile::tempdir().unwrap();
    let runner = IterationRunner::new(&compiler, &rasterizer, &PixelDiffer, &config, output.path());
    let command = LocateEntities::new(
        "citations",
        CitationExtractor::new().unwrap(),
        runner,
        vec![fixture.paper.clone(), missing],
    );

    let stats = run_command(&command).unwrap();
    assert_eq!(stats.items, 2);
    assert_eq!(stats.outputs, 1);
    assert_eq!(stats.skipped, 1);

    let digest = command.digest();
    let counts = digest.get("citations").unwrap();
    assert_eq!(counts.extracted, 2);
    assert_eq!(counts.colorized, 2);
    assert_eq!(counts.located, 2);
}
