//! Domain-specific errors.

use thiserror::Error;

/// Raised by execution surfaces that can no longer accept payloads.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("console process has terminated")]
    Terminated,
}
