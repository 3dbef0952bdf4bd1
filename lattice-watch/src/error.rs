//! Error Handling
//!
//! Nothing in the watch machinery is fatal. Errors fall into three groups:
//!
//! - Invalid sources and paths, reported as warnings at registration time.
//!   The offending source is replaced by a getter that yields `Undefined`.
//! - Panics raised by user code (getters, callbacks, cleanup hooks). These are
//!   caught by [`call_with_error_handling`] and handed to the configured error
//!   handler, so one failing watcher never stops the rest of a flush.
//! - Registry conflicts in the legacy API (duplicate watcher names), which are
//!   logged and otherwise ignored.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::config;

/// Where a piece of user code was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorContext {
    /// The getter derived from a watch source.
    WatchGetter,
    /// A watch callback, or the body of a bare effect.
    WatchCallback,
    /// A cleanup hook registered through `OnCleanup`.
    WatchCleanup,
    /// A job being drained from one of the scheduler queues.
    Scheduler,
    /// The expression getter of a legacy watcher.
    LegacyGetter,
    /// The callback of a legacy watcher.
    LegacyCallback,
    /// The synchronous first call of an `immediate` legacy watcher.
    ImmediateCallback,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::WatchGetter => "watcher getter",
            Self::WatchCallback => "watcher callback",
            Self::WatchCleanup => "watcher cleanup function",
            Self::Scheduler => "scheduler flush",
            Self::LegacyGetter => "legacy watcher getter",
            Self::LegacyCallback => "legacy watcher callback",
            Self::ImmediateCallback => "immediate watcher callback",
        };
        f.write_str(label)
    }
}

/// Errors and warnings produced by the watch machinery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    /// A watch source that is not a ref, a reactive object, a getter, or a
    /// sequence of those.
    #[error(
        "invalid watch source: {0}. A watch source can only be a getter function, \
         a ref, a reactive object, or an array of these types"
    )]
    InvalidSource(String),

    /// A legacy watch path that cannot be parsed.
    #[error(
        "failed watching path: \"{0}\". Watcher only accepts simple dot-delimited \
         paths. For full control, use a getter instead"
    )]
    InvalidPath(String),

    /// User code panicked.
    #[error("unhandled error during execution of {context}: {message}")]
    UserCode {
        context: ErrorContext,
        message: String,
    },

    /// A named legacy watcher was registered under a name already in use.
    #[error("duplicate watcher name \"{0}\"; the previous watcher keeps running but is no longer reachable by name")]
    DuplicateWatcher(String),

    /// A job re-queued itself more often than the configured limit in one flush.
    #[error("maximum recursive updates exceeded ({limit}) for job {job}")]
    RecursionLimit { job: u64, limit: usize },
}

impl WatchError {
    /// Whether this error is a warning (logged, never sent to the error handler).
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource(_) | Self::InvalidPath(_) | Self::DuplicateWatcher(_)
        )
    }
}

/// Run a piece of user code, catching any panic it raises.
///
/// Returns `None` if the code panicked. The panic is converted into
/// [`WatchError::UserCode`] and reported through [`handle_error`].
pub fn call_with_error_handling<R>(context: ErrorContext, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            handle_error(WatchError::UserCode {
                context,
                message: panic_message(payload.as_ref()),
            });
            None
        }
    }
}

/// Report an error to the configured error handler, or log it.
pub fn handle_error(error: WatchError) {
    match config::error_handler() {
        Some(handler) => handler(&error),
        None => tracing::error!(%error, "unhandled watch error"),
    }
}

/// Report a warning. Warnings are always logged and also forwarded to the
/// configured warn handler, if any.
pub fn warn(error: WatchError) {
    match &error {
        WatchError::DuplicateWatcher(name) => {
            tracing::error!(name = %name, "{error}");
        }
        _ => tracing::warn!("{error}"),
    }
    if let Some(handler) = config::warn_handler() {
        handler(&error);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn panics_are_caught_and_reported() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        config::configure(|c| {
            c.error_handler = Some(Arc::new(move |e: &WatchError| {
                seen_clone.lock().push(e.clone());
            }));
        });

        let result: Option<i32> =
            call_with_error_handling(ErrorContext::WatchCallback, || panic!("boom"));
        assert!(result.is_none());

        let errors = seen.lock();
        assert_eq!(
            *errors,
            vec![WatchError::UserCode {
                context: ErrorContext::WatchCallback,
                message: "boom".to_string(),
            }]
        );
        drop(errors);
        config::reset();
    }

    #[test]
    fn successful_calls_pass_through() {
        assert_eq!(
            call_with_error_handling(ErrorContext::WatchGetter, || 7),
            Some(7)
        );
    }

    #[test]
    fn formatted_panics_keep_their_message() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        config::configure(|c| {
            c.error_handler = Some(Arc::new(move |e: &WatchError| {
                *seen_clone.lock() = Some(e.to_string());
            }));
        });

        call_with_error_handling(ErrorContext::WatchCleanup, || panic!("code {}", 42));
        assert_eq!(
            seen.lock().as_deref(),
            Some("unhandled error during execution of watcher cleanup function: code 42")
        );
        config::reset();
    }

    #[test]
    fn warnings_are_classified() {
        assert!(WatchError::InvalidSource("1".into()).is_warning());
        assert!(WatchError::DuplicateWatcher("a".into()).is_warning());
        assert!(!WatchError::RecursionLimit { job: 1, limit: 100 }.is_warning());
    }
}
