//! Bounded retries for remote fetches.

use std::fmt::Display;
use std::thread;
use std::time::Duration;
use texloc_core::{LocatorError, Result};

/// Run `op` up to `attempts` times, sleeping `backoff` between attempts.
///
/// `op` receives the attempt number, starting at 1.
///
/// # Errors
///
/// Returns [`LocatorError::FetchFailure`] carrying the last error once every
/// attempt has failed.
pub fn retry_with_backoff<T, E, F>(item: &str, attempts: u32, backoff: Duration, mut op: F) -> Result<T>
where
    E: Display,
    F: FnMut(u32) -> std::result::Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match op(attempt) {
            Ok(value) => {
                if attempt > 1 {
                    log::info!("Fetched '{item}' on attempt {attempt}");
                }
                return Ok(value);
            }
            Err(e) => {
                log::warn!("Attempt {attempt}/{attempts} for '{item}' failed: {e}");
                last_error = e.to_string();
                if attempt < attempts {
                    thread::sleep(backoff);
                }
            }
        }
    }

    Err(LocatorError::FetchFailure {
        item: item.to_string(),
        attempts,
        reason: last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_after_transient_failures() {
        let mut calls = 0;
        let value = retry_with_backoff("2101.00001", 3, Duration::ZERO, |attempt| {
            calls += 1;
            if attempt < 3 {
                Err("connection reset")
            } else {
                Ok(attempt)
            }
        })
        .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhaustion_reports_last_error() {
        let err = retry_with_backoff::<(), _, _>("2101.00001", 2, Duration::ZERO, |attempt| {
            Err(format!("HTTP 50{attempt}"))
        })
        .unwrap_err();
        match err {
            LocatorError::FetchFailure {
                item,
                attempts,
                reason,
            } => {
                assert_eq!(item, "2101.00001");
                assert_eq!(attempts, 2);
                assert_eq!(reason, "HTTP 502");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _ = retry_with_backoff::<(), _, _>("x", 0, Duration::ZERO, |_| {
            calls += 1;
            Err("nope")
        });
        assert_eq!(calls, 1);
    }
}
