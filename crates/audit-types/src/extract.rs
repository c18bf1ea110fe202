//! Metric label extraction from audit events.

use crate::event::AuditEvent;

/// Label value used when no client name can be derived from the user agent.
pub const UNKNOWN_USER: &str = "unknown";

/// Resource label for events that reference no object.
const NO_RESOURCE: &str = "None";

/// Derives the client name from a user agent string.
///
/// Takes the part before the first `/`, then its first whitespace-separated
/// token: `kubectl/v1.29 (linux/amd64) kubernetes/abcdef` becomes `kubectl`.
/// Returns [`UNKNOWN_USER`] when nothing is left.
#[must_use]
pub fn extract_user_agent(user_agent: &str) -> String {
    let product = user_agent.split('/').next().unwrap_or_default();
    match product.split_whitespace().next() {
        Some(name) => name.to_string(),
        None => UNKNOWN_USER.to_string(),
    }
}

/// Builds the resource label: `resource[.apiGroup][/subresource]`.
#[must_use]
pub fn extract_resource_name(event: &AuditEvent) -> String {
    let Some(object_ref) = event.object_ref.as_ref() else {
        return NO_RESOURCE.to_string();
    };

    let mut name = object_ref.resource.clone();
    if !object_ref.api_group.is_empty() {
        name.push('.');
        name.push_str(&object_ref.api_group);
    }
    if !object_ref.subresource.is_empty() {
        name.push('/');
        name.push_str(&object_ref.subresource);
    }
    name
}
