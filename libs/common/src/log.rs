//! log_msg!() vs Logger
//! ---
//!
//! There are two ways deployment code reports progress:
//!
//! 1. A one-off message, then we use `log_msg!()` exactly like the apps calling
//!    contracts always did.
//!
//! 2. A message that belongs to a named step (deploying a module, upgrading a
//!    proxy), then we use `Logger::task()` so that the step opens a span, and
//!    everything logged inside it, including nested steps, is reported under it.
//!
//! Both end up in `tracing`. Where it goes is decided by the binary that
//! installs the subscriber.
//!

use std::{fmt::Display, future::Future};

use tracing::{Instrument, Level};

#[doc(hidden)]
pub use tracing as __tracing;

#[macro_export]
macro_rules! log_msg {
    ($fmt:literal $(, $args:expr)*) => {
        $crate::log::__tracing::info!($fmt $(, $args)*);
    };
}

/// Leveled, tagged logging with scoped named steps.
///
/// Cheap to clone, every clone reports into the same span tree.
#[derive(Clone, Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }

    pub fn log(&self, level: Level, tag: &str, msg: impl Display) {
        match level {
            Level::ERROR => tracing::error!(tag, "{}", msg),
            Level::WARN => tracing::warn!(tag, "{}", msg),
            Level::INFO => tracing::info!(tag, "{}", msg),
            Level::DEBUG => tracing::debug!(tag, "{}", msg),
            Level::TRACE => tracing::trace!(tag, "{}", msg),
        }
    }

    pub fn info(&self, tag: &str, msg: impl Display) {
        self.log(Level::INFO, tag, msg)
    }

    pub fn warn(&self, tag: &str, msg: impl Display) {
        self.log(Level::WARN, tag, msg)
    }

    /// Run `fut` as a named step.
    ///
    /// Start and end of the step are logged, and the result of `fut` is
    /// returned unchanged. Steps started from within `fut` nest under this one.
    pub async fn task<T, F>(&self, name: impl Into<String>, fut: F) -> eyre::Result<T>
    where
        F: Future<Output = eyre::Result<T>>,
    {
        let name = name.into();
        let span = tracing::info_span!("task", name = %name);
        async move {
            tracing::info!("started");
            match fut.await {
                Ok(value) => {
                    tracing::info!("finished");
                    Ok(value)
                }
                Err(err) => {
                    tracing::warn!("failed: {}", err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}
