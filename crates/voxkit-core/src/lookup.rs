//! Message-id lookup table.
//!
//! Streamed attachment chunks arrive keyed by their parent directive's
//! message id, not by any queue position, so the sequencer keeps every
//! tracked directive in this table from admission until completion or
//! cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use voxkit_types::Directive;

/// Maps message id to the directive awaiting that id's attachment bytes.
#[derive(Debug, Default)]
pub struct LookupTable {
    by_message_id: HashMap<String, Arc<Directive>>,
}

impl LookupTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `message_id` to `directive`. Last write wins.
    pub fn set(&mut self, message_id: &str, directive: Arc<Directive>) {
        self.by_message_id.insert(message_id.into(), directive);
    }

    /// Find the directive for `message_id`.
    pub fn find(&self, message_id: &str) -> Option<Arc<Directive>> {
        self.by_message_id.get(message_id).cloned()
    }

    /// Remove the mapping for `message_id`. Idempotent.
    pub fn remove(&mut self, message_id: &str) -> Option<Arc<Directive>> {
        self.by_message_id.remove(message_id)
    }

    /// Drop all mappings.
    pub fn clear(&mut self) {
        self.by_message_id.clear();
    }

    /// Number of tracked directives.
    pub fn len(&self) -> usize {
        self.by_message_id.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_message_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use voxkit_types::DirectiveHeader;

    fn directive(msg_id: &str) -> Arc<Directive> {
        let mut header = DirectiveHeader::local("TTS", "Speak", "d1");
        header.message_id = msg_id.into();
        Arc::new(Directive::new(header, json!({})))
    }

    #[test]
    fn set_find_remove() {
        let mut table = LookupTable::new();
        let dir = directive("m1");
        table.set("m1", dir.clone());

        let found = table.find("m1").unwrap();
        assert_eq!(found.message_id(), "m1");
        assert!(table.find("m2").is_none());

        assert!(table.remove("m1").is_some());
        assert!(table.find("m1").is_none());
        // idempotent
        assert!(table.remove("m1").is_none());
    }

    #[test]
    fn set_overwrites_prior_mapping() {
        let mut table = LookupTable::new();
        let first = directive("m1");
        table.set("m1", first);

        let mut header = DirectiveHeader::local("AudioPlayer", "Play", "d2");
        header.message_id = "m1".into();
        let second = Arc::new(Directive::new(header, json!({})));
        table.set("m1", second);

        assert_eq!(table.len(), 1);
        assert_eq!(table.find("m1").unwrap().namespace(), "AudioPlayer");
    }
}
