//! Error types for the voxkit SDK core.
//!
//! The sequencer itself reports failure through boolean returns (a local
//! failure must never block protocol progress), so [`DirectiveError`] only
//! covers the edges where real errors occur: parsing inbound directive JSON
//! and feeding attachment streams.

use thiserror::Error;

/// Errors raised while constructing a [`Directive`](crate::Directive) from
/// wire data or feeding its attachment stream.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DirectiveError {
    /// The inbound JSON could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level field was absent from the directive object.
    #[error("missing directive field: {0}")]
    MissingField(&'static str),

    /// Attachment data arrived after the stream was closed.
    #[error("attachment stream already closed for message {message_id}")]
    AttachmentClosed {
        /// Message id of the directive whose stream was closed.
        message_id: String,
    },
}
