//! Errors from the engine's command-backed queries.

use thiserror::Error;
use warchest_exec::CommandError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("unparsable {what} output: {output:?}")]
    Unparsable { what: &'static str, output: String },
}
