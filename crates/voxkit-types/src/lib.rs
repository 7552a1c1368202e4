//! # voxkit-types
//!
//! Core types for the voxkit voice-assistant client SDK.
//!
//! Contains the [`Directive`](directive::Directive) unit of work delivered by
//! the cloud dialog service, the blocking-policy types that govern directive
//! admission, and the shared error types. Runtime machinery (the sequencer,
//! schedulers, capability agents) lives in `voxkit-core`.

pub mod directive;
pub mod error;
pub mod policy;

pub use directive::{AttachmentChunk, Directive, DirectiveHeader};
pub use error::DirectiveError;
pub use policy::{BlockingMedium, BlockingPolicy};
