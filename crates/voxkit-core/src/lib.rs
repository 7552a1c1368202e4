//! # voxkit-core
//!
//! The directive sequencer engine for the voxkit voice-assistant SDK.
//!
//! The network layer hands every inbound cloud directive to the
//! [`DirectiveSequencer`](sequencer::DirectiveSequencer), which enforces
//! per-type blocking policies keyed by a logical medium (audio / visual),
//! queues conflicting directives per dialog turn, and delivers them to
//! registered capability listeners at controlled times. Streamed attachment
//! bytes (e.g. TTS audio) are routed to the waiting directive through the
//! message-id lookup table.
//!
//! Dispatch of directives promoted out of the pending queue is deferred to
//! the host loop's next idle slot via the [`scheduler`] abstraction, so a
//! burst of completions never recurses into listener callbacks.

pub mod dialog;
pub mod lookup;
pub mod policy;
pub mod scheduler;
pub mod sequencer;

pub use scheduler::{IdleScheduler, ManualIdleScheduler, TokioIdleScheduler};
pub use sequencer::{DirectiveListener, DirectiveSequencer};
