use http::StatusCode;
use thiserror::Error;

use super::http::HttpError;

/// Errors of a single refresh, none of them but `Cancelled` and
/// `OutputClosed` stops the discovery.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] HttpError),

    #[error("non 2xx status '{0}' response during marathon service discovery")]
    UnexpectedStatus(StatusCode),

    #[error("{source} in {url}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("no marathon server configured")]
    NoServers,

    #[error("marathon discovery cancelled")]
    Cancelled,

    #[error("output of marathon discovery closed")]
    OutputClosed,
}
