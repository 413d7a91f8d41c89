use log::trace;

use crate::schema::{FieldKey, FieldValue, RedactionSet};

/// Projects one labeled value into a `**label:** value` line.
///
/// Returns `None` when the key is redacted (directly or through its group) or
/// the value has nothing printable. The redaction check runs before the value
/// is looked at.
pub fn project<K: FieldKey>(
    label: &str,
    value: &FieldValue,
    key: K,
    redacted: &RedactionSet<K>,
) -> Option<String> {
    if redacted.covers(key) {
        trace!("Suppressed redacted field {}.{}", K::SECTION, key.as_str());
        return None;
    }
    let text = value.display()?;
    Some(format!("**{}:** {}", label, text))
}

/// Like [`project`], but renders a highlighted `**PREFIX: value**` line.
pub fn project_callout<K: FieldKey>(
    prefix: &str,
    value: &FieldValue,
    key: K,
    redacted: &RedactionSet<K>,
) -> Option<String> {
    if redacted.covers(key) {
        trace!("Suppressed redacted callout {}.{}", K::SECTION, key.as_str());
        return None;
    }
    let text = value.display()?;
    Some(format!("**{}: {}**", prefix, text))
}
