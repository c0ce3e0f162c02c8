//! Fetching paper sources, as a batch command.

use crate::command::Command;
use crate::retry::retry_with_backoff;
use std::path::{Path, PathBuf};
use std::time::Duration;
use texloc_core::{LocatorConfig, Result};

/// Downloads the sources of one paper.
pub trait Fetcher {
    /// Fetch `paper_id` into `dest`, returning the path written.
    ///
    /// # Errors
    ///
    /// Returns an error for any failed attempt; callers decide whether to retry.
    fn fetch(&self, paper_id: &str, dest: &Path) -> Result<PathBuf>;
}

/// Fetch with the configured attempts and backoff.
///
/// # Errors
///
/// Returns [`texloc_core::LocatorError::FetchFailure`] once every attempt failed.
pub fn fetch_with_retry<F: Fetcher + ?Sized>(
    fetcher: &F,
    paper_id: &str,
    dest: &Path,
    attempts: u32,
    backoff: Duration,
) -> Result<PathBuf> {
    retry_with_backoff(paper_id, attempts, backoff, |_| fetcher.fetch(paper_id, dest))
}

/// Batch command fetching the sources of a list of papers.
///
/// A paper whose fetch still fails after retrying is logged and skipped; the
/// rest of the batch continues.
pub struct FetchSources<F> {
    fetcher: F,
    paper_ids: Vec<String>,
    dest_root: PathBuf,
    attempts: u32,
    backoff: Duration,
}

impl<F: Fetcher> FetchSources<F> {
    pub fn new(
        fetcher: F,
        paper_ids: Vec<String>,
        dest_root: impl Into<PathBuf>,
        config: &LocatorConfig,
    ) -> Self {
        Self {
            fetcher,
            paper_ids,
            dest_root: dest_root.into(),
            attempts: config.fetch_attempts,
            backoff: config.fetch_backoff(),
        }
    }
}

impl<F: Fetcher> Command for FetchSources<F> {
    type Item = String;
    type Output = PathBuf;

    fn name(&self) -> &str {
        "fetch-sources"
    }

    fn description(&self) -> &str {
        "Download the TeX sources of each paper"
    }

    fn load(&self) -> Result<Box<dyn Iterator<Item = String> + '_>> {
        std::fs::create_dir_all(&self.dest_root)?;
        Ok(Box::new(self.paper_ids.iter().cloned()))
    }

    fn process<'a>(&'a self, item: &'a String) -> Box<dyn Iterator<Item = Result<PathBuf>> + 'a> {
        let dest = crate::workspace::paper_dir(&self.dest_root, item).join("sources");
        match fetch_with_retry(&self.fetcher, item, &dest, self.attempts, self.backoff) {
            Ok(path) => Box::new(std::iter::once(Ok(path))),
            Err(e) if !e.is_fatal() => {
                log::warn!("Skipping paper {item}: {e}");
                Box::new(std::iter::empty())
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn save(&self, item: &String, output: PathBuf) -> Result<()> {
        log::info!("Fetched {item} to {}", output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::run_command;
    use std::cell::Cell;
    use texloc_core::{LocatorConfigBuilder, LocatorError};

    /// Fails the first `failures` calls for papers starting with "flaky", and
    /// every call for papers starting with "gone".
    struct FlakyFetcher {
        failures: u32,
        calls: Cell<u32>,
    }

    impl Fetcher for FlakyFetcher {
        fn fetch(&self, paper_id: &str, dest: &Path) -> Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            let flaky = paper_id.starts_with("flaky") && self.calls.get() <= self.failures;
            if flaky || paper_id.starts_with("gone") {
                return Err(LocatorError::Io(std::io::Error::other("connection reset")));
            }
            std::fs::create_dir_all(dest)?;
            Ok(dest.to_path_buf())
        }
    }

    fn config() -> LocatorConfig {
        LocatorConfigBuilder::new().fetch_retry(3, 0).build().unwrap()
    }

    #[test]
    fn test_flaky_fetch_is_retried() {
        let dest = tempfile::tempdir().unwrap();
        let fetcher = FlakyFetcher {
            failures: 2,
            calls: Cell::new(0),
        };
        let path = fetch_with_retry(&fetcher, "flaky-1", dest.path(), 3, Duration::ZERO).unwrap();
        assert_eq!(path, dest.path());
        assert_eq!(fetcher.calls.get(), 3);
    }

    #[test]
    fn test_failed_paper_is_skipped_not_fatal() {
        let dest = tempfile::tempdir().unwrap();
        let command = FetchSources::new(
            FlakyFetcher {
                failures: 0,
                calls: Cell::new(0),
            },
            vec!["2101.00001".to_string(), "gone-1".to_string(), "hep-th/9901001".to_string()],
            dest.path(),
            &config(),
        );
        let stats = run_command(&command).unwrap();
        assert_eq!(stats.items, 3);
        assert_eq!(stats.outputs, 2);
        assert_eq!(stats.skipped, 1);
        assert!(dest.path().join("hep-th_9901001/sources").is_dir());
        // 1 + 3 attempts + 1
        assert_eq!(command.fetcher.calls.get(), 5);
    }
}
