//! Workload identity used as the correlation key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::ObjectRef;
use crate::snapshot::ObjectMeta;

/// A workload identity: `{name, namespace}`.
///
/// The default (empty) value denotes an unknown or unnamed object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Object name.
    pub name: String,
    /// Object namespace (empty for cluster-scoped objects).
    pub namespace: String,
}

impl Target {
    /// Creates a target from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Builds a target from an event's object reference.
    ///
    /// A missing reference or an unnamed one yields the unknown target.
    #[must_use]
    pub fn from_object_ref(object_ref: Option<&ObjectRef>) -> Self {
        match object_ref {
            Some(r) if !r.name.is_empty() => Self::new(r.name.clone(), r.namespace.clone()),
            _ => Self::default(),
        }
    }

    /// Builds a target from decoded object metadata.
    #[must_use]
    pub fn from_meta(meta: &ObjectMeta) -> Self {
        Self::new(meta.name.clone(), meta.namespace.clone())
    }

    /// Returns true if this is the unknown target.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.name.is_empty() && self.namespace.is_empty()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_unknown() {
        assert!(Target::default().is_unknown());
        assert!(!Target::new("web-0", "prod").is_unknown());
    }

    #[test]
    fn from_object_ref_requires_name() {
        let named = ObjectRef {
            resource: "pods".to_string(),
            namespace: "prod".to_string(),
            name: "web-0".to_string(),
            ..ObjectRef::default()
        };
        assert_eq!(
            Target::from_object_ref(Some(&named)),
            Target::new("web-0", "prod")
        );

        let unnamed = ObjectRef {
            namespace: "prod".to_string(),
            ..ObjectRef::default()
        };
        assert!(Target::from_object_ref(Some(&unnamed)).is_unknown());
        assert!(Target::from_object_ref(None).is_unknown());
    }

    #[test]
    fn display_includes_namespace() {
        assert_eq!(Target::new("web-0", "prod").to_string(), "prod/web-0");
        assert_eq!(Target::new("node-a", "").to_string(), "node-a");
    }

    #[test]
    fn equal_targets_hash_equal() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Target::new("a", "ns"));
        set.insert(Target::new("a", "ns"));
        set.insert(Target::new("a", "other"));
        assert_eq!(set.len(), 2);
    }
}
