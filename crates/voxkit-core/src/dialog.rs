//! Per-dialog ordered directive lists.
//!
//! The sequencer keeps two of these: *pending* (admitted but not yet
//! dispatched) and *active* (currently handed to listeners). Each maps a
//! dialog id to the ordered sequence of directives for that conversational
//! turn; a dialog's entry is erased as soon as its sequence drains so the
//! map only ever holds dialogs with work in flight.
//!
//! Directives are identified by message id; the same directive is never in
//! both lists at once (the sequencer moves it, it does not copy it).

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use voxkit_types::{BlockingMedium, Directive};

/// An ordered collection of directives, grouped and keyed by dialog id.
#[derive(Debug, Default)]
pub struct DialogDirectiveList {
    dialogs: BTreeMap<String, VecDeque<Arc<Directive>>>,
}

impl DialogDirectiveList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `directive` to its dialog's sequence, creating the sequence
    /// if this is the dialog's first entry.
    pub fn push(&mut self, directive: Arc<Directive>) {
        self.dialogs
            .entry(directive.dialog_id().into())
            .or_default()
            .push_back(directive);
    }

    /// Remove `directive` from its dialog's sequence, erasing the dialog
    /// entry if the sequence drains. No-op if the directive is not present.
    pub fn remove(&mut self, directive: &Directive) -> bool {
        let Some(queue) = self.dialogs.get_mut(directive.dialog_id()) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|d| d.message_id() != directive.message_id());
        let removed = queue.len() != before;
        if queue.is_empty() {
            self.dialogs.remove(directive.dialog_id());
        }
        removed
    }

    /// Drain every directive for `dialog_id`, invoking `notify` for each in
    /// queue order, and erase the dialog entry.
    pub fn remove_dialog<F>(&mut self, dialog_id: &str, mut notify: F)
    where
        F: FnMut(&Arc<Directive>),
    {
        if let Some(queue) = self.dialogs.remove(dialog_id) {
            for directive in &queue {
                notify(directive);
            }
        }
    }

    /// Drain only the directives for `dialog_id` whose fully-qualified name
    /// (`"Namespace.Name"`) equals `qualified_name`, invoking `notify` for
    /// each. Other entries keep their relative order.
    pub fn remove_by_name<F>(&mut self, dialog_id: &str, qualified_name: &str, mut notify: F)
    where
        F: FnMut(&Arc<Directive>),
    {
        let Some(queue) = self.dialogs.get_mut(dialog_id) else {
            return;
        };
        let mut kept = VecDeque::with_capacity(queue.len());
        for directive in queue.drain(..) {
            if directive.qualified_name() == qualified_name {
                notify(&directive);
            } else {
                kept.push_back(directive);
            }
        }
        *queue = kept;
        if queue.is_empty() {
            self.dialogs.remove(dialog_id);
        }
    }

    /// First directive in `dialog_id`'s sequence whose assigned medium is
    /// `medium`, if any.
    pub fn find_by_medium(&self, dialog_id: &str, medium: BlockingMedium) -> Option<Arc<Directive>> {
        self.dialogs.get(dialog_id)?.iter().find(|d| d.policy().medium == medium).cloned()
    }

    /// Whether some directive already listed for `candidate`'s dialog
    /// shares its medium and is itself blocking.
    pub fn is_block_by_policy(&self, candidate: &Directive) -> bool {
        let medium = candidate.policy().medium;
        self.dialogs
            .get(candidate.dialog_id())
            .map(|queue| {
                queue.iter().any(|d| {
                    let policy = d.policy();
                    policy.medium == medium && policy.is_blocking
                })
            })
            .unwrap_or(false)
    }

    /// Whether `dialog_id` has no directives listed.
    pub fn is_empty_dialog(&self, dialog_id: &str) -> bool {
        !self.dialogs.contains_key(dialog_id)
    }

    /// Linear scan across all dialogs for the first directive of type
    /// `namespace.name`, in dialog-id order.
    pub fn find(&self, namespace: &str, name: &str) -> Option<Arc<Directive>> {
        self.dialogs
            .values()
            .flatten()
            .find(|d| d.namespace() == namespace && d.name() == name)
            .cloned()
    }

    /// Snapshot of `dialog_id`'s sequence in queue order.
    pub fn snapshot(&self, dialog_id: &str) -> Vec<Arc<Directive>> {
        self.dialogs
            .get(dialog_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All dialog ids with at least one directive listed.
    pub fn dialog_ids(&self) -> Vec<String> {
        self.dialogs.keys().cloned().collect()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.dialogs.clear();
    }

    /// Total number of directives across all dialogs.
    pub fn len(&self) -> usize {
        self.dialogs.values().map(VecDeque::len).sum()
    }

    /// Whether no directives are listed at all.
    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}
