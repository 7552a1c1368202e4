//! The directive sequencer façade.
//!
//! Accepts inbound directives from the network layer, assigns their
//! blocking policy, runs admission control against the per-dialog active
//! and pending lists, and delivers admitted directives to the capability
//! listeners registered for their namespace. Completion promotes further
//! pending work for the same dialog; promotions are dispatched on the host
//! loop's next idle slot (see [`crate::scheduler`]), never inline.
//!
//! All state lives behind one mutex, and listener callbacks are always
//! invoked with the mutex released, so listeners may call back into the
//! sequencer (`complete`, `add`, `cancel`) from inside their own handlers.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};

use voxkit_types::{AttachmentChunk, BlockingMedium, BlockingPolicy, Directive};

use crate::dialog::DialogDirectiveList;
use crate::lookup::LookupTable;
use crate::policy::PolicyTable;
use crate::scheduler::IdleScheduler;

/// Namespace of the protocol's "no further directives" sentinel.
pub const NO_DIRECTIVE_NAMESPACE: &str = "System";

/// Name of the protocol's "no further directives" sentinel.
pub const NO_DIRECTIVE_NAME: &str = "NoDirective";

fn is_no_directive(directive: &Directive) -> bool {
    directive.namespace() == NO_DIRECTIVE_NAMESPACE && directive.name() == NO_DIRECTIVE_NAME
}

/// Capability-agent callbacks, registered per namespace.
///
/// Listeners for one namespace are invoked in registration order.
pub trait DirectiveListener: Send + Sync {
    /// Opportunity to fully intercept a directive before admission control.
    ///
    /// Returning `true` means this listener now owns the directive's
    /// lifecycle; the sequencer stops propagation and never tracks it.
    fn on_pre_handle_directive(&self, directive: &Arc<Directive>) -> bool {
        let _ = directive;
        false
    }

    /// Perform the directive's effect.
    ///
    /// Returning `false` signals failure: the sequencer force-completes the
    /// directive and no further listeners see it.
    fn on_handle_directive(&self, directive: &Arc<Directive>) -> bool;

    /// Notification that a tracked directive was canceled. The sequencer
    /// releases its references immediately after this call.
    fn on_cancel_directive(&self, directive: &Arc<Directive>) {
        let _ = directive;
    }
}

struct SequencerState {
    policies: PolicyTable,
    /// namespace -> listeners, in registration order
    listeners: HashMap<String, Vec<Arc<dyn DirectiveListener>>>,
    lookup: LookupTable,
    pending: DialogDirectiveList,
    active: DialogDirectiveList,
    /// Promoted directives awaiting the next idle flush.
    scheduled: VecDeque<Arc<Directive>>,
    /// Whether a flush is already queued on the idle scheduler.
    idler_armed: bool,
    /// Dialog id of the most recent full cancel; directives for it are
    /// rejected until the `System.NoDirective` sentinel arrives.
    last_cancel_dialog_id: String,
}

/// Orders, queues, and dispatches cloud directives to capability agents.
///
/// Single-threaded cooperative model: every public operation runs to
/// completion synchronously; the only deferred work is dispatch of
/// directives promoted out of the pending queue.
pub struct DirectiveSequencer {
    state: Mutex<SequencerState>,
    scheduler: Arc<dyn IdleScheduler>,
    weak_self: Weak<DirectiveSequencer>,
}

impl DirectiveSequencer {
    /// Create a sequencer that defers promoted-directive dispatch through
    /// `scheduler`.
    pub fn new(scheduler: Arc<dyn IdleScheduler>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            state: Mutex::new(SequencerState {
                policies: PolicyTable::new(),
                listeners: HashMap::new(),
                lookup: LookupTable::new(),
                pending: DialogDirectiveList::new(),
                active: DialogDirectiveList::new(),
                scheduled: VecDeque::new(),
                idler_armed: false,
                last_cancel_dialog_id: String::new(),
            }),
            scheduler,
            weak_self: weak_self.clone(),
        })
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Register a listener for `namespace`. A listener already registered
    /// for that namespace is not added twice.
    pub fn add_listener(&self, namespace: &str, listener: Arc<dyn DirectiveListener>) {
        let mut state = self.state.lock().unwrap();
        let listeners = state.listeners.entry(namespace.into()).or_default();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregister a listener from `namespace`; the namespace entry is
    /// erased once its last listener is removed.
    pub fn remove_listener(&self, namespace: &str, listener: &Arc<dyn DirectiveListener>) {
        let mut state = self.state.lock().unwrap();
        let Some(listeners) = state.listeners.get_mut(namespace) else {
            warn!(namespace, "can't find the namespace");
            return;
        };
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        if listeners.len() == before {
            warn!(namespace, "can't find the listener");
            return;
        }
        if listeners.is_empty() {
            state.listeners.remove(namespace);
        }
    }

    /// Register the blocking policy for `namespace.name`.
    ///
    /// Returns `false` if a policy already exists for that key; the first
    /// registration stays authoritative.
    pub fn add_policy(&self, namespace: &str, name: &str, policy: BlockingPolicy) -> bool {
        self.state.lock().unwrap().policies.add(namespace, name, policy)
    }

    /// The policy for `namespace.name`, default for unregistered types.
    pub fn get_policy(&self, namespace: &str, name: &str) -> BlockingPolicy {
        self.state.lock().unwrap().policies.get(namespace, name)
    }

    // ── Admission ────────────────────────────────────────────────────

    /// Admit a newly arrived directive.
    ///
    /// Returns `false` (and takes no ownership) when no listener is
    /// registered for the namespace, or when the directive belongs to the
    /// most recently fully-canceled dialog and is not the
    /// `System.NoDirective` sentinel. On success the directive is either
    /// dispatched immediately or queued behind conflicting work for its
    /// dialog.
    pub fn add(&self, directive: Arc<Directive>) -> bool {
        let namespace = directive.namespace().to_string();
        let listeners = {
            let state = self.state.lock().unwrap();
            let Some(listeners) = state.listeners.get(&namespace) else {
                warn!(%namespace, "can't find capability agent");
                return false;
            };
            if !state.last_cancel_dialog_id.is_empty()
                && state.last_cancel_dialog_id == directive.dialog_id()
                && !is_no_directive(&directive)
            {
                warn!(
                    dialog_id = directive.dialog_id(),
                    qualified = %directive.qualified_name(),
                    "dialog already canceled; reject directive"
                );
                return false;
            }
            directive.assign_policy(state.policies.get(&namespace, directive.name()));
            listeners.clone()
        };

        let policy = directive.policy();
        debug!(
            qualified = %directive.qualified_name(),
            medium = ?policy.medium,
            is_blocking = policy.is_blocking,
            "receive directive"
        );

        // A pre-handling listener takes over the directive entirely.
        for listener in &listeners {
            if listener.on_pre_handle_directive(&directive) {
                debug!(qualified = %directive.qualified_name(), "directive pre-handled");
                return true;
            }
        }

        let dispatch_now = {
            let mut state = self.state.lock().unwrap();
            state.lookup.set(directive.message_id(), directive.clone());

            let dialog_id = directive.dialog_id();
            let blocked = state
                .active
                .find_by_medium(dialog_id, BlockingMedium::Any)
                .is_some()
                || state
                    .pending
                    .find_by_medium(dialog_id, BlockingMedium::Any)
                    .is_some()
                || state.active.is_block_by_policy(&directive)
                || (policy.medium == BlockingMedium::Any
                    && !state.active.is_empty_dialog(dialog_id));

            if blocked {
                debug!(
                    qualified = %directive.qualified_name(),
                    dialog_id,
                    "queue directive behind in-flight work"
                );
                state.pending.push(directive.clone());
            } else {
                state.active.push(directive.clone());
            }
            !blocked
        };

        if dispatch_now {
            self.handle_directive(&directive);
        }
        true
    }

    // ── Completion and promotion ─────────────────────────────────────

    /// Complete a directive: stop tracking it and promote further pending
    /// work for its dialog.
    ///
    /// Safe to call for a directive the sequencer no longer tracks (the
    /// removals are no-ops); the promotion scan still runs.
    pub fn complete(&self, directive: &Arc<Directive>) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            state.active.remove(directive);
            state
                .scheduled
                .retain(|d| d.message_id() != directive.message_id());
            state.lookup.remove(directive.message_id());
        }
        let policy = directive.policy();
        debug!(
            qualified = %directive.qualified_name(),
            medium = ?policy.medium,
            is_blocking = policy.is_blocking,
            "directive completed"
        );
        self.next_directive(directive.dialog_id());
        true
    }

    /// Promote every eligible pending directive for `dialog_id` to the
    /// active list and queue it for the next idle flush.
    ///
    /// Candidates are scanned in arrival order. An exclusive (ANY-medium)
    /// directive already active stops the scan outright; a same-medium
    /// blocking conflict skips only that candidate.
    fn next_directive(&self, dialog_id: &str) {
        let arm = {
            let mut state = self.state.lock().unwrap();
            let mut promoted = false;
            for candidate in state.pending.snapshot(dialog_id) {
                if state
                    .active
                    .find_by_medium(dialog_id, BlockingMedium::Any)
                    .is_some()
                {
                    debug!(dialog_id, "exclusive directive in flight; stop promotion scan");
                    break;
                }
                if state.active.is_block_by_policy(&candidate) {
                    continue;
                }
                if candidate.policy().medium == BlockingMedium::Any
                    && !state.active.is_empty_dialog(dialog_id)
                {
                    continue;
                }
                debug!(
                    qualified = %candidate.qualified_name(),
                    dialog_id,
                    "promote pending directive"
                );
                state.pending.remove(&candidate);
                state.active.push(candidate.clone());
                state.scheduled.push_back(candidate);
                promoted = true;
            }
            if promoted && !state.idler_armed {
                state.idler_armed = true;
                true
            } else {
                false
            }
        };
        if arm {
            self.arm_flush();
        }
    }

    fn arm_flush(&self) {
        let Some(sequencer) = self.weak_self.upgrade() else {
            return;
        };
        self.scheduler
            .schedule(Box::new(move || sequencer.flush_scheduled()));
    }

    /// Dispatch every scheduled directive, draining the queue one entry at
    /// a time so completions and cancellations during dispatch are
    /// respected.
    fn flush_scheduled(&self) {
        debug!("idle flush: dispatch promoted directives");
        loop {
            let next = {
                let mut state = self.state.lock().unwrap();
                let next = state.scheduled.pop_front();
                if next.is_none() {
                    state.idler_armed = false;
                }
                next
            };
            match next {
                Some(directive) => self.handle_directive(&directive),
                None => break,
            }
        }
    }

    /// Hand a directive to every listener for its namespace, in
    /// registration order. The first listener to return `false` aborts
    /// propagation and force-completes the directive.
    fn handle_directive(&self, directive: &Arc<Directive>) {
        debug!(qualified = %directive.qualified_name(), "process directive");
        directive.set_active(true);

        for listener in self.listeners_for(directive.namespace()) {
            if !listener.on_handle_directive(directive) {
                warn!(qualified = %directive.qualified_name(), "failed to handle directive");
                self.complete(directive);
                return;
            }
        }
    }

    fn listeners_for(&self, namespace: &str) -> Vec<Arc<dyn DirectiveListener>> {
        self.state
            .lock()
            .unwrap()
            .listeners
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    // ── Cancellation ─────────────────────────────────────────────────

    /// Cancel every directive for `dialog_id` and mark the dialog as
    /// canceled: later `add()` calls for it are rejected until the
    /// `System.NoDirective` sentinel arrives.
    ///
    /// With `cancel_active` false, currently active directives keep
    /// running and must still be completed normally.
    pub fn cancel(&self, dialog_id: &str, cancel_active: bool) -> bool {
        debug!(dialog_id, cancel_active, "cancel dialog");
        let mut canceled: Vec<Arc<Directive>> = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            state.last_cancel_dialog_id = dialog_id.into();
            state.scheduled.retain(|d| d.dialog_id() != dialog_id);

            let SequencerState {
                pending,
                active,
                lookup,
                ..
            } = &mut *state;
            pending.remove_dialog(dialog_id, |d| {
                lookup.remove(d.message_id());
                canceled.push(d.clone());
            });
            if cancel_active {
                active.remove_dialog(dialog_id, |d| {
                    lookup.remove(d.message_id());
                    canceled.push(d.clone());
                });
            }
        }
        for directive in &canceled {
            self.cancel_directive(directive);
        }
        true
    }

    /// Cancel only the directives for `dialog_id` whose fully-qualified
    /// names (`"Namespace.Name"`) appear in `groups`.
    ///
    /// Does not mark the dialog as canceled. If nothing remains active or
    /// scheduled for the dialog afterwards, the promotion scan resumes any
    /// still-pending work; otherwise the in-flight directive's own
    /// completion will trigger promotion.
    pub fn cancel_groups(&self, dialog_id: &str, groups: &HashSet<String>) -> bool {
        debug!(dialog_id, ?groups, "cancel directive groups");
        let mut canceled: Vec<Arc<Directive>> = Vec::new();
        let resume = {
            let mut state = self.state.lock().unwrap();
            let mut names: Vec<&String> = groups.iter().collect();
            names.sort();
            for qualified_name in names {
                state.scheduled.retain(|d| {
                    d.dialog_id() != dialog_id || d.qualified_name() != *qualified_name
                });
                let SequencerState {
                    pending,
                    active,
                    lookup,
                    ..
                } = &mut *state;
                pending.remove_by_name(dialog_id, qualified_name, |d| {
                    lookup.remove(d.message_id());
                    canceled.push(d.clone());
                });
                active.remove_by_name(dialog_id, qualified_name, |d| {
                    lookup.remove(d.message_id());
                    canceled.push(d.clone());
                });
            }
            state.active.is_empty_dialog(dialog_id)
                && !state.scheduled.iter().any(|d| d.dialog_id() == dialog_id)
        };
        for directive in &canceled {
            self.cancel_directive(directive);
        }
        if resume {
            self.next_directive(dialog_id);
        }
        true
    }

    /// Cancel every tracked directive in every dialog and clear the
    /// canceled-dialog marker (no single dialog is singled out).
    pub fn cancel_all(&self, cancel_active: bool) -> bool {
        debug!(cancel_active, "cancel all dialogs");
        let mut canceled: Vec<Arc<Directive>> = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            state.last_cancel_dialog_id.clear();
            state.scheduled.clear();

            let SequencerState {
                pending,
                active,
                lookup,
                ..
            } = &mut *state;
            for dialog_id in pending.dialog_ids() {
                pending.remove_dialog(&dialog_id, |d| {
                    lookup.remove(d.message_id());
                    canceled.push(d.clone());
                });
            }
            if cancel_active {
                for dialog_id in active.dialog_ids() {
                    active.remove_dialog(&dialog_id, |d| {
                        lookup.remove(d.message_id());
                        canceled.push(d.clone());
                    });
                }
            }
        }
        for directive in &canceled {
            self.cancel_directive(directive);
        }
        true
    }

    fn cancel_directive(&self, directive: &Arc<Directive>) {
        debug!(qualified = %directive.qualified_name(), "cancel directive");
        for listener in self.listeners_for(directive.namespace()) {
            listener.on_cancel_directive(directive);
        }
    }

    // ── Queries and plumbing ─────────────────────────────────────────

    /// The dialog id of the most recent full cancel, if any. Cleared by
    /// [`cancel_all`](Self::cancel_all) and [`reset`](Self::reset).
    pub fn canceled_dialog_id(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        if state.last_cancel_dialog_id.is_empty() {
            None
        } else {
            Some(state.last_cancel_dialog_id.clone())
        }
    }

    /// Find a not-yet-dispatched directive of type `namespace.name`.
    pub fn find_pending(&self, namespace: &str, name: &str) -> Option<Arc<Directive>> {
        self.state.lock().unwrap().pending.find(namespace, name)
    }

    /// Drop all tracked directives and the canceled-dialog marker without
    /// notifying anyone. Policies and listeners survive.
    ///
    /// Used on network re-connect, when every in-flight exchange is moot.
    pub fn reset(&self) {
        debug!("reset sequencer state");
        let mut state = self.state.lock().unwrap();
        state.lookup.clear();
        state.pending.clear();
        state.active.clear();
        state.scheduled.clear();
        state.last_cancel_dialog_id.clear();
    }

    /// Route one streamed attachment chunk to the directive waiting for
    /// it. Chunks for unknown message ids are dropped.
    pub fn on_attachment(&self, chunk: AttachmentChunk) {
        let directive = {
            self.state
                .lock()
                .unwrap()
                .lookup
                .find(&chunk.parent_message_id)
        };
        let Some(directive) = directive else {
            warn!(
                parent_message_id = %chunk.parent_message_id,
                "can't find directive for attachment; dropping chunk"
            );
            return;
        };

        if chunk.seq == 0 {
            debug!(
                message_id = directive.message_id(),
                dialog_id = directive.dialog_id(),
                media_type = %chunk.media_type,
                "first attachment chunk"
            );
        }

        directive.set_media_type(&chunk.media_type);
        if let Err(err) = directive.append_data(&chunk.data) {
            warn!(%err, "attachment chunk rejected");
        }
        if chunk.is_end {
            debug!(
                message_id = directive.message_id(),
                "attachment stream complete"
            );
            directive.close_data();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualIdleScheduler;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voxkit_types::DirectiveHeader;

    struct CountListener {
        pre_handles: AtomicUsize,
        handles: AtomicUsize,
        cancels: AtomicUsize,
        intercept: bool,
    }

    impl CountListener {
        fn new(intercept: bool) -> Arc<Self> {
            Arc::new(Self {
                pre_handles: AtomicUsize::new(0),
                handles: AtomicUsize::new(0),
                cancels: AtomicUsize::new(0),
                intercept,
            })
        }
    }

    impl DirectiveListener for CountListener {
        fn on_pre_handle_directive(&self, _directive: &Arc<Directive>) -> bool {
            self.pre_handles.fetch_add(1, Ordering::SeqCst);
            self.intercept
        }

        fn on_handle_directive(&self, _directive: &Arc<Directive>) -> bool {
            self.handles.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn on_cancel_directive(&self, _directive: &Arc<Directive>) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn directive(namespace: &str, name: &str, dialog_id: &str, msg_id: &str) -> Arc<Directive> {
        let mut header = DirectiveHeader::local(namespace, name, dialog_id);
        header.message_id = msg_id.into();
        Arc::new(Directive::new(header, json!({})))
    }

    fn sequencer() -> (Arc<DirectiveSequencer>, Arc<ManualIdleScheduler>) {
        let sched = Arc::new(ManualIdleScheduler::new());
        (DirectiveSequencer::new(sched.clone()), sched)
    }

    #[test]
    fn add_without_listener_is_rejected() {
        let (seq, _sched) = sequencer();
        let dir = directive("Invalid", "Test", "d1", "m1");
        assert!(!seq.add(dir.clone()));
        // never tracked: not visible to attachments either
        assert!(seq.find_pending("Invalid", "Test").is_none());
        assert!(!dir.is_active());
    }

    #[test]
    fn listener_sees_pre_handle_then_handle() {
        let (seq, _sched) = sequencer();
        let listener = CountListener::new(false);
        seq.add_listener("TTS", listener.clone());

        let dir = directive("TTS", "Speak", "d1", "m1");
        assert!(seq.add(dir.clone()));
        assert_eq!(listener.pre_handles.load(Ordering::SeqCst), 1);
        assert_eq!(listener.handles.load(Ordering::SeqCst), 1);
        assert!(dir.is_active());
        assert!(seq.complete(&dir));
    }

    #[test]
    fn pre_handle_interception_skips_admission() {
        let (seq, _sched) = sequencer();
        let listener = CountListener::new(true);
        seq.add_listener("TTS", listener.clone());

        let dir = directive("TTS", "Speak", "d1", "m1");
        assert!(seq.add(dir.clone()));
        assert_eq!(listener.pre_handles.load(Ordering::SeqCst), 1);
        assert_eq!(listener.handles.load(Ordering::SeqCst), 0);
        // not tracked: attachment routing can't see it
        seq.on_attachment(AttachmentChunk {
            parent_message_id: "m1".into(),
            seq: 0,
            is_end: false,
            media_type: "audio/mpeg".into(),
            data: b"xxx".to_vec(),
        });
        assert_eq!(dir.data_len(), 0);
    }

    #[test]
    fn removed_listener_no_longer_receives() {
        let (seq, _sched) = sequencer();
        let listener = CountListener::new(false);
        seq.add_listener("TTS", listener.clone());
        // duplicate registration is ignored
        seq.add_listener("TTS", listener.clone());

        let dir = directive("TTS", "Speak", "d1", "m1");
        assert!(seq.add(dir.clone()));
        assert_eq!(listener.handles.load(Ordering::SeqCst), 1);
        seq.complete(&dir);

        let dyn_listener: Arc<dyn DirectiveListener> = listener.clone();
        seq.remove_listener("TTS", &dyn_listener);
        assert!(!seq.add(directive("TTS", "Speak", "d1", "m2")));
        assert_eq!(listener.handles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_handler_force_completes() {
        struct FailingListener;
        impl DirectiveListener for FailingListener {
            fn on_handle_directive(&self, _directive: &Arc<Directive>) -> bool {
                false
            }
        }

        let (seq, sched) = sequencer();
        seq.add_listener("TTS", Arc::new(FailingListener));
        assert!(seq.add_policy("TTS", "Speak", BlockingPolicy::new(BlockingMedium::Audio, true)));

        let failing = directive("TTS", "Speak", "d1", "m1");
        assert!(seq.add(failing));

        // the dialog is free again: a second blocking directive dispatches
        let ok = CountListener::new(false);
        seq.add_listener("AudioPlayer", ok.clone());
        assert!(seq.add_policy(
            "AudioPlayer",
            "Play",
            BlockingPolicy::new(BlockingMedium::Audio, true)
        ));
        assert!(seq.add(directive("AudioPlayer", "Play", "d1", "m2")));
        sched.run_pending();
        assert_eq!(ok.handles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attachment_routes_to_tracked_directive() {
        let (seq, _sched) = sequencer();
        let listener = CountListener::new(false);
        seq.add_listener("TTS", listener);

        let dir = directive("TTS", "Speak", "d1", "m1");
        assert!(seq.add(dir.clone()));

        seq.on_attachment(AttachmentChunk {
            parent_message_id: "m1".into(),
            seq: 0,
            is_end: false,
            media_type: "audio/mpeg".into(),
            data: b"abc".to_vec(),
        });
        seq.on_attachment(AttachmentChunk {
            parent_message_id: "m1".into(),
            seq: 1,
            is_end: true,
            media_type: "audio/mpeg".into(),
            data: b"def".to_vec(),
        });

        assert_eq!(dir.take_data(), b"abcdef");
        assert!(dir.is_data_closed());
        assert_eq!(dir.media_type().as_deref(), Some("audio/mpeg"));

        // unknown parent id: silently dropped
        seq.on_attachment(AttachmentChunk {
            parent_message_id: "m999".into(),
            seq: 0,
            is_end: false,
            media_type: "audio/mpeg".into(),
            data: b"zzz".to_vec(),
        });
    }

    #[test]
    fn complete_releases_attachment_routing() {
        let (seq, _sched) = sequencer();
        seq.add_listener("TTS", CountListener::new(false));

        let dir = directive("TTS", "Speak", "d1", "m1");
        assert!(seq.add(dir.clone()));
        assert!(seq.complete(&dir));

        seq.on_attachment(AttachmentChunk {
            parent_message_id: "m1".into(),
            seq: 0,
            is_end: false,
            media_type: "audio/mpeg".into(),
            data: b"late".to_vec(),
        });
        assert_eq!(dir.data_len(), 0);

        // double-complete is harmless
        assert!(seq.complete(&dir));
    }

    #[test]
    fn reset_clears_tracking_and_cancel_marker() {
        let (seq, _sched) = sequencer();
        seq.add_listener("TTS", CountListener::new(false));
        assert!(seq.add_policy("TTS", "Speak", BlockingPolicy::new(BlockingMedium::Audio, true)));

        assert!(seq.add(directive("TTS", "Speak", "d1", "m1")));
        assert!(seq.add(directive("TTS", "Speak", "d1", "m2")));
        assert!(seq.find_pending("TTS", "Speak").is_some());

        assert!(seq.cancel("d2", true));
        assert_eq!(seq.canceled_dialog_id().as_deref(), Some("d2"));

        seq.reset();
        assert!(seq.find_pending("TTS", "Speak").is_none());
        assert_eq!(seq.canceled_dialog_id(), None);
        // policies survive reset
        assert!(!seq.add_policy("TTS", "Speak", BlockingPolicy::default()));
    }
}
