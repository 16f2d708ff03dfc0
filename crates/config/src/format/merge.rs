//! Merging a decoded document onto the current target document.

use serde_json::Value;

use super::document::Document;

/// Apply `incoming` onto `current`.
///
/// Objects merge key by key, recursing into nested values; anything else
/// replaces what was there. At struct levels a key without an exact match
/// falls back to an ASCII case-insensitive match against the field names, so
/// `"Port"` lands on a field serialized as `port`. Map entries only match
/// exactly. Values the input does not mention are left as they were.
pub(crate) fn merge_document(current: &mut Document, incoming: Value) {
    match (current, incoming) {
        (Document::Struct(fields), Value::Object(incoming)) => {
            for (key, value) in incoming {
                let slot = match fields.iter().position(|(name, _)| *name == key) {
                    Some(index) => Some(index),
                    None => fields
                        .iter()
                        .position(|(name, _)| name.eq_ignore_ascii_case(&key)),
                };
                match slot {
                    Some(index) => merge_document(&mut fields[index].1, value),
                    None => fields.push((key, Document::from_json(value))),
                }
            }
        }
        (Document::Map(entries), Value::Object(incoming)) => {
            for (key, value) in incoming {
                let slot = entries.iter().position(|(existing, _)| {
                    existing.key_text().as_deref() == Some(key.as_str())
                });
                match slot {
                    Some(index) => merge_document(&mut entries[index].1, value),
                    None => entries.push((Document::String(key), Document::from_json(value))),
                }
            }
        }
        (Document::Variant(name, Some(content)), Value::Object(mut incoming))
            if incoming.len() == 1 && incoming.contains_key(name.as_str()) =>
        {
            if let Some(value) = incoming.remove(name.as_str()) {
                merge_document(content, value);
            }
        }
        (slot, Value::Null) if matches!(slot, Document::Some(_)) => *slot = Document::None,
        (Document::Some(inner), value) => merge_document(inner, value),
        (slot, value) => *slot = Document::from_json(value),
    }
}
