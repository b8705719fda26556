//! Failures specific to the pricing page flow.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("No address suggestions were offered for {0:?}")]
    NoSuggestions(String),

    #[error("Missing href for first plan PDF link")]
    MissingHref,

    #[error("Browser fetch failed: {status} {status_text}. Body: {body}")]
    FetchFailed {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Downloaded PDF at {0} is empty")]
    EmptyDownload(String),

    #[error("Popup URL {0} is not a PDF")]
    NotAPdfUrl(String),
}
