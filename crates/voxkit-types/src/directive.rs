//! The directive unit of work and its wire representation.
//!
//! A [`Directive`] is one instruction delivered from the cloud dialog
//! service to a capability agent: a JSON header identifying it, an opaque
//! JSON payload, and an optional streamed binary attachment (e.g. TTS
//! audio) that arrives separately, keyed by the directive's message id.
//!
//! Directives are shared by reference (`Arc<Directive>`): the network layer
//! creates them, the sequencer tracks them while queued or in flight, and a
//! capability agent may keep one alive past completion while it drains the
//! attachment stream. The identity fields are immutable; the scheduling
//! attributes and attachment buffer use interior mutability so every holder
//! sees the same state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DirectiveError;
use crate::policy::BlockingPolicy;

/// The identity header of a directive, as carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveHeader {
    /// Capability namespace (e.g. "TTS", "AudioPlayer").
    pub namespace: String,

    /// Directive name within the namespace (e.g. "Speak").
    pub name: String,

    /// Capability interface version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Unique message id; also keys the attachment stream.
    pub message_id: String,

    /// Correlation id grouping all directives of one conversational turn.
    #[serde(rename = "dialogRequestId")]
    pub dialog_id: String,

    /// Causal link to the message this directive responds to, if any.
    #[serde(
        rename = "referrerDialogRequestId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub referrer_id: Option<String>,
}

fn default_version() -> String {
    "1.0".into()
}

impl DirectiveHeader {
    /// Build a header with a freshly minted v4 message id.
    ///
    /// Intended for locally originated directives and tests; wire
    /// directives carry server-assigned ids.
    pub fn local(namespace: &str, name: &str, dialog_id: &str) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: default_version(),
            message_id: Uuid::new_v4().to_string(),
            dialog_id: dialog_id.into(),
            referrer_id: None,
        }
    }
}

/// One chunk of a directive's streamed binary attachment.
///
/// Attachments arrive out-of-band from the directive JSON, keyed by the
/// parent directive's message id plus a sequence number and an
/// end-of-stream flag.
#[derive(Debug, Clone)]
pub struct AttachmentChunk {
    /// Message id of the directive this chunk belongs to.
    pub parent_message_id: String,
    /// Zero-based chunk sequence number.
    pub seq: u32,
    /// True when this is the final chunk of the stream.
    pub is_end: bool,
    /// MIME type of the attachment (e.g. "audio/mpeg").
    pub media_type: String,
    /// Raw attachment bytes. May be empty on the terminating chunk.
    pub data: Vec<u8>,
}

/// Buffered attachment state, shared across all holders of the directive.
#[derive(Debug, Default)]
struct AttachmentBuffer {
    media_type: Option<String>,
    data: Vec<u8>,
    closed: bool,
}

/// A unit of instruction from the cloud dialog service.
///
/// Identity and payload are fixed at construction. The blocking policy is
/// assigned once by the sequencer during admission; the `active` flag flips
/// when the directive is handed to its listeners.
#[derive(Debug)]
pub struct Directive {
    header: DirectiveHeader,
    payload: Value,
    received_at: DateTime<Utc>,
    policy: Mutex<BlockingPolicy>,
    active: AtomicBool,
    attachment: Mutex<AttachmentBuffer>,
}

impl Directive {
    /// Create a directive from a parsed header and payload.
    pub fn new(header: DirectiveHeader, payload: Value) -> Self {
        Self {
            header,
            payload,
            received_at: Utc::now(),
            policy: Mutex::new(BlockingPolicy::default()),
            active: AtomicBool::new(false),
            attachment: Mutex::new(AttachmentBuffer::default()),
        }
    }

    /// Parse one inbound directive object of the form
    /// `{"header": {...}, "payload": {...}}`.
    ///
    /// The payload is optional on the wire and defaults to an empty object.
    pub fn from_json(value: Value) -> Result<Self, DirectiveError> {
        let Value::Object(mut obj) = value else {
            return Err(DirectiveError::MissingField("header"));
        };
        let header = obj
            .remove("header")
            .ok_or(DirectiveError::MissingField("header"))?;
        let header: DirectiveHeader = serde_json::from_value(header)?;
        let payload = obj
            .remove("payload")
            .unwrap_or_else(|| Value::Object(Default::default()));
        Ok(Self::new(header, payload))
    }

    /// Capability namespace.
    pub fn namespace(&self) -> &str {
        &self.header.namespace
    }

    /// Directive name within the namespace.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// `"Namespace.Name"`, the fully-qualified directive type.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.header.namespace, self.header.name)
    }

    /// Unique message id.
    pub fn message_id(&self) -> &str {
        &self.header.message_id
    }

    /// Dialog correlation id.
    pub fn dialog_id(&self) -> &str {
        &self.header.dialog_id
    }

    /// Causal referrer id, if the server supplied one.
    pub fn referrer_id(&self) -> Option<&str> {
        self.header.referrer_id.as_deref()
    }

    /// Capability interface version.
    pub fn version(&self) -> &str {
        &self.header.version
    }

    /// Opaque JSON payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// When this directive object was created locally.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// The blocking policy assigned by the sequencer during admission.
    ///
    /// Defaults to `{NONE, non-blocking}` until assignment.
    pub fn policy(&self) -> BlockingPolicy {
        *self.policy.lock().unwrap()
    }

    /// Assign the blocking policy. Called once by the sequencer.
    pub fn assign_policy(&self, policy: BlockingPolicy) {
        *self.policy.lock().unwrap() = policy;
    }

    /// Whether the directive has been handed to its listeners.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the directive as handed to (or withdrawn from) listeners.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Record the attachment MIME type. Last write wins.
    pub fn set_media_type(&self, media_type: &str) {
        self.attachment.lock().unwrap().media_type = Some(media_type.into());
    }

    /// The attachment MIME type, once known.
    pub fn media_type(&self) -> Option<String> {
        self.attachment.lock().unwrap().media_type.clone()
    }

    /// Append attachment bytes to the buffer.
    pub fn append_data(&self, data: &[u8]) -> Result<(), DirectiveError> {
        let mut buf = self.attachment.lock().unwrap();
        if buf.closed {
            return Err(DirectiveError::AttachmentClosed {
                message_id: self.header.message_id.clone(),
            });
        }
        buf.data.extend_from_slice(data);
        Ok(())
    }

    /// Mark the attachment stream as complete. Idempotent.
    pub fn close_data(&self) {
        self.attachment.lock().unwrap().closed = true;
    }

    /// Whether the attachment stream has ended.
    pub fn is_data_closed(&self) -> bool {
        self.attachment.lock().unwrap().closed
    }

    /// Bytes currently buffered and not yet drained.
    pub fn data_len(&self) -> usize {
        self.attachment.lock().unwrap().data.len()
    }

    /// Drain all buffered attachment bytes.
    ///
    /// The consuming agent calls this repeatedly while streaming; each call
    /// returns the bytes that arrived since the previous one.
    pub fn take_data(&self) -> Vec<u8> {
        std::mem::take(&mut self.attachment.lock().unwrap().data)
    }
}
