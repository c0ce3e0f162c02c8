//! Locating one entity type across a list of papers, as a batch command.

use crate::command::Command;
use crate::digest::Digest;
use crate::runner::{IterationRunner, PaperReport, PaperSource};
use std::cell::RefCell;
use texloc_core::Result;
use texloc_tex::{Colorizable, EntityExtractor};

/// Extract, colorize and locate the entities found by `extractor` in each
/// paper, collecting counts in a [`Digest`].
///
/// Papers whose sources do not compile, or whose TeX cannot be read, are
/// skipped. Fatal errors (an ambiguous extractor grammar) abort the batch.
pub struct LocateEntities<'a, X> {
    entity_type: String,
    extractor: X,
    runner: IterationRunner<'a>,
    papers: Vec<PaperSource>,
    digest: RefCell<Digest>,
}

impl<'a, X> LocateEntities<'a, X>
where
    X: EntityExtractor,
    X::Entity: Colorizable + Clone,
{
    pub fn new(
        entity_type: impl Into<String>,
        extractor: X,
        runner: IterationRunner<'a>,
        papers: Vec<PaperSource>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            extractor,
            runner,
            papers,
            digest: RefCell::new(Digest::new()),
        }
    }

    /// Counts collected so far.
    #[must_use]
    pub fn digest(&self) -> Digest {
        self.digest.borrow().clone()
    }

    fn locate(&self, paper: &PaperSource) -> Result<Option<PaperReport>> {
        let tex = std::fs::read_to_string(paper.tex_file())?;
        let entities = self.extractor.parse(&tex)?;
        log::debug!(
            "Paper {}: {} {} extracted",
            paper.paper_id,
            entities.len(),
            self.entity_type
        );
        self.runner.locate(paper, &tex, &entities)
    }
}

impl<X> Command for LocateEntities<'_, X>
where
    X: EntityExtractor,
    X::Entity: Colorizable + Clone,
{
    type Item = PaperSource;
    type Output = PaperReport;

    fn name(&self) -> &str {
        "locate-entities"
    }

    fn description(&self) -> &str {
        "Colorize entities, compile each iteration and decode entity boxes from page diffs"
    }

    fn load(&self) -> Result<Box<dyn Iterator<Item = PaperSource> + '_>> {
        std::fs::create_dir_all(self.runner.output_root())?;
        Ok(Box::new(self.papers.iter().cloned()))
    }

    fn process<'b>(
        &'b self,
        item: &'b PaperSource,
    ) -> Box<dyn Iterator<Item = Result<PaperReport>> + 'b> {
        match self.locate(item) {
            Ok(report) => Box::new(report.into_iter().map(Ok)),
            Err(e) if !e.is_fatal() => {
                log::warn!("Skipping paper {}: {e}", item.paper_id);
                Box::new(std::iter::empty())
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn save(&self, _item: &PaperSource, output: PaperReport) -> Result<()> {
        let mut digest = self.digest.borrow_mut();
        digest.record_extracted(&self.entity_type, output.entities);
        digest.record_colorized(&self.entity_type, output.colorized);
        digest.record_located(&self.entity_type, output.located);
        Ok(())
    }
}
