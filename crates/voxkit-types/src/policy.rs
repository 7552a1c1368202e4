//! Blocking-policy types for directive admission control.
//!
//! Each directive type (`Namespace.Name`) is assigned a [`BlockingPolicy`]
//! by its capability agent at registration time. The policy decides which
//! directives may run concurrently within one dialog: directives sharing a
//! [`BlockingMedium`] with an in-flight *blocking* directive are queued
//! until that directive completes.

use serde::{Deserialize, Serialize};

/// Coarse resource category used to decide directive concurrency.
///
/// Two directives conflict only when they claim the same medium (or one of
/// them claims [`BlockingMedium::Any`], which is exclusive against
/// everything in the dialog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockingMedium {
    /// Audio output or capture (TTS playback, ASR recording).
    Audio,
    /// Screen rendering (display templates, chips).
    Visual,
    /// No resource claim; never blocks and is never blocked.
    None,
    /// Exclusive claim on the whole dialog; nothing else may be in flight.
    Any,
}

/// The admission policy for one directive type.
///
/// Immutable once registered: re-registering a `Namespace.Name` pair fails
/// and leaves the first registration authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingPolicy {
    /// Which resource this directive type claims.
    pub medium: BlockingMedium,
    /// Whether an in-flight directive of this type blocks same-medium
    /// directives behind it.
    pub is_blocking: bool,
}

impl BlockingPolicy {
    /// Construct a policy.
    pub const fn new(medium: BlockingMedium, is_blocking: bool) -> Self {
        Self {
            medium,
            is_blocking,
        }
    }
}

impl Default for BlockingPolicy {
    /// The policy applied to unregistered directive types: no medium,
    /// non-blocking. Such directives never block anything and are never
    /// blocked.
    fn default() -> Self {
        Self::new(BlockingMedium::None, false)
    }
}
