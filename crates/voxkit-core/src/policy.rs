//! Blocking-policy registration table.
//!
//! Capability agents register one [`BlockingPolicy`] per directive type
//! (`Namespace.Name`) during initialization. The table is read-only during
//! operation: registration is first-wins and there is no removal.

use std::collections::HashMap;

use tracing::{debug, warn};
use voxkit_types::BlockingPolicy;

/// Maps `(namespace, name)` to the [`BlockingPolicy`] for that directive
/// type. Unregistered types resolve to the default (no medium,
/// non-blocking), so they never block anything and are never blocked.
#[derive(Debug, Default)]
pub struct PolicyTable {
    /// namespace -> name -> policy
    policies: HashMap<String, HashMap<String, BlockingPolicy>>,
}

impl PolicyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy for `namespace.name`.
    ///
    /// Returns `false` without modifying the table if a policy already
    /// exists for that key; the first registration stays authoritative.
    pub fn add(&mut self, namespace: &str, name: &str, policy: BlockingPolicy) -> bool {
        let names = self.policies.entry(namespace.into()).or_default();
        if names.contains_key(name) {
            warn!(namespace, name, "policy already exists");
            return false;
        }
        debug!(
            namespace,
            name,
            medium = ?policy.medium,
            is_blocking = policy.is_blocking,
            "add policy"
        );
        names.insert(name.into(), policy);
        true
    }

    /// Resolve the policy for `namespace.name`, falling back to the
    /// default for unregistered types.
    pub fn get(&self, namespace: &str, name: &str) -> BlockingPolicy {
        self.policies
            .get(namespace)
            .and_then(|names| names.get(name))
            .copied()
            .unwrap_or_default()
    }

    /// Number of registered policies across all namespaces.
    pub fn len(&self) -> usize {
        self.policies.values().map(HashMap::len).sum()
    }

    /// Whether no policies are registered.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
