//! Load / process / save batch commands.
//!
//! A [`Command`] loads a finite sequence of work items, turns each item into
//! zero or more outputs, and saves each output. [`run_command`] drives one
//! command through its states:
//!
//! ```text
//! Idle -> Loading -> (Processing -> Saving)* -> Done
//! ```
//!
//! Any error aborts the whole run. Retrying is the business of the command
//! itself (see [`crate::retry`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use texloc_core::Result;

/// A batch command.
pub trait Command {
    type Item;
    type Output;

    /// Short name used on the command line and in logs.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Work items for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the items cannot be listed.
    fn load(&self) -> Result<Box<dyn Iterator<Item = Self::Item> + '_>>;

    /// Outputs for one item. An empty sequence skips the item.
    fn process<'a>(
        &'a self,
        item: &'a Self::Item,
    ) -> Box<dyn Iterator<Item = Result<Self::Output>> + 'a>;

    /// Persist one output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn save(&self, item: &Self::Item, output: Self::Output) -> Result<()>;
}

/// Driver state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchState {
    Idle,
    Loading,
    Processing,
    Saving,
    Done,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Processing => "processing",
            Self::Saving => "saving",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Counts from a finished batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Items loaded and processed
    pub items: usize,
    /// Outputs saved
    pub outputs: usize,
    /// Items that produced no output
    pub skipped: usize,
}

/// Run `command` to completion.
///
/// # Errors
///
/// Returns the first error raised by `load`, `process` or `save`.
pub fn run_command<C: Command>(command: &C) -> Result<BatchStats> {
    run_command_observed(command, |state| {
        log::debug!("{}: {}", command.name(), state);
    })
}

/// Like [`run_command`], reporting every state transition to `on_state`.
///
/// # Errors
///
/// Returns the first error raised by `load`, `process` or `save`.
pub fn run_command_observed<C: Command>(
    command: &C,
    mut on_state: impl FnMut(BatchState),
) -> Result<BatchStats> {
    let mut stats = BatchStats::default();
    on_state(BatchState::Idle);

    on_state(BatchState::Loading);
    let items = command.load()?;

    for item in items {
        on_state(BatchState::Processing);
        let mut produced = 0;
        for output in command.process(&item) {
            let output = output?;
            on_state(BatchState::Saving);
            command.save(&item, output)?;
            produced += 1;
        }
        stats.items += 1;
        stats.outputs += produced;
        if produced == 0 {
            stats.skipped += 1;
        }
    }

    on_state(BatchState::Done);
    log::info!(
        "{}: {} items, {} outputs saved, {} skipped",
        command.name(),
        stats.items,
        stats.outputs,
        stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use texloc_core::LocatorError;

    /// Emits `n` copies of each item `n`, failing on `fail_on`.
    struct Repeat {
        items: Vec<usize>,
        fail_on: Option<usize>,
        saved: RefCell<Vec<usize>>,
    }

    impl Command for Repeat {
        type Item = usize;
        type Output = usize;

        fn name(&self) -> &str {
            "repeat"
        }

        fn description(&self) -> &str {
            "Repeat each number as many times as its value"
        }

        fn load(&self) -> Result<Box<dyn Iterator<Item = usize> + '_>> {
            Ok(Box::new(self.items.iter().copied()))
        }

        fn process<'a>(&'a self, item: &'a usize) -> Box<dyn Iterator<Item = Result<usize>> + 'a> {
            if Some(*item) == self.fail_on {
                return Box::new(std::iter::once(Err(LocatorError::config("bad item"))));
            }
            Box::new(std::iter::repeat(*item).take(*item).map(Ok))
        }

        fn save(&self, _item: &usize, output: usize) -> Result<()> {
            self.saved.borrow_mut().push(output);
            Ok(())
        }
    }

    #[test]
    fn test_states_and_stats() {
        let command = Repeat {
            items: vec![2, 0, 1],
            fail_on: None,
            saved: RefCell::new(Vec::new()),
        };
        let mut states = Vec::new();
        let stats = run_command_observed(&command, |state| states.push(state)).unwrap();

        assert_eq!(
            stats,
            BatchStats {
                items: 3,
                outputs: 3,
                skipped: 1
            }
        );
        assert_eq!(*command.saved.borrow(), [2, 2, 1]);
        use BatchState::*;
        assert_eq!(
            states,
            [Idle, Loading, Processing, Saving, Saving, Processing, Processing, Saving, Done]
        );
    }

    #[test]
    fn test_error_aborts_run() {
        let command = Repeat {
            items: vec![1, 3, 1],
            fail_on: Some(3),
            saved: RefCell::new(Vec::new()),
        };
        assert!(run_command(&command).is_err());
        assert_eq!(*command.saved.borrow(), [1]);
    }
}
