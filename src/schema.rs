//! Typed building blocks of a care record: field values, per-section field
//! keys, redaction sets and the section container itself.

use chrono::{DateTime, Utc};
use log::warn;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{GuideError, Result};

/// Matches a line break together with the whitespace around it.
const LINE_BREAK_PATTERN: &str = r"\s*[\r\n]+\s*";

pub(crate) static ABSENT: FieldValue = FieldValue::Absent;

/// A single field value as stored by the record owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    #[default]
    Absent,
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns the printable form of the value, or `None` when there is
    /// nothing worth printing. List entries are joined with `", "`.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Text(text) => normalize(text),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().filter_map(|item| normalize(item)).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display().is_none()
    }

    /// Interprets a stored value of a list-typed field. Only an actual list
    /// is trusted; a bare string or anything else degrades to `Absent`.
    pub fn from_json_list(raw: Value) -> Self {
        match raw {
            Value::Null => Self::Absent,
            Value::Array(_) => Self::from_json(raw),
            other => {
                warn!("Treating non-list value ({}) of a list field as absent", json_kind(&other));
                Self::Absent
            }
        }
    }

    /// Removes the value stored under `key` from a section column and
    /// decodes it according to the field's shape.
    pub(crate) fn take<K: FieldKey>(map: &mut Map<String, Value>, key: K) -> Self {
        let raw = map.remove(key.as_str()).unwrap_or(Value::Null);
        if key.is_list() {
            Self::from_json_list(raw)
        } else {
            Self::from_json(raw)
        }
    }

    /// Interprets a loosely typed stored value. Anything that is not text, a
    /// number or a list of those degrades to `Absent`.
    pub fn from_json(raw: Value) -> Self {
        match raw {
            Value::Null => Self::Absent,
            Value::String(text) => Self::Text(text),
            Value::Number(number) => Self::Text(number.to_string()),
            Value::Array(items) => {
                let total = items.len();
                let entries: Vec<String> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        Value::Number(number) => Some(number.to_string()),
                        _ => None,
                    })
                    .collect();
                if entries.len() != total {
                    warn!(
                        "Dropped {} malformed list entries from field value",
                        total - entries.len()
                    );
                }
                Self::List(entries)
            }
            other => {
                warn!("Treating malformed field value ({}) as absent", json_kind(&other));
                Self::Absent
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Opens a stored section column. A column that is not an object holds no
/// usable values and reads as empty.
pub(crate) fn field_map(section: &'static str, raw: Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            warn!("Treating malformed {} column ({}) as empty", section, json_kind(&other));
            Map::new()
        }
    }
}

/// Decodes a display-only timestamp column. Unparseable values are dropped.
pub(crate) fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    let stamp = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => match text.trim().parse::<DateTime<Utc>>() {
            Ok(at) => Some(at),
            Err(err) => {
                warn!("Ignoring malformed timestamp: {}", err);
                None
            }
        },
        other => {
            warn!("Ignoring malformed timestamp ({})", json_kind(&other));
            None
        }
    };
    Ok(stamp)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Trims a value and folds embedded line breaks so a value can never open a
/// new markup line of its own.
fn normalize(text: &str) -> Option<String> {
    static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let re = LINE_BREAKS.get_or_init(|| Regex::new(LINE_BREAK_PATTERN).expect("valid pattern"));
    Some(re.replace_all(trimmed, " ").into_owned())
}

/// Key of one field (or one group of fields) inside a section.
pub trait FieldKey: Copy + Ord + fmt::Debug + 'static {
    /// Wire name of the section this key belongs to.
    const SECTION: &'static str;
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn label(self) -> &'static str;

    /// The group key covering this field, if any.
    fn group(self) -> Option<Self>;

    /// True for fields whose stored value must be a list.
    fn is_list(self) -> bool {
        false
    }

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.as_str() == name)
    }
}

/// Typed field bag of one section kind.
pub trait SectionFields: Default {
    type Key: FieldKey;

    /// Value stored under `key`; group keys always read as absent.
    fn value(&self, key: Self::Key) -> &FieldValue;
}

/// Field keys the record owner never wants to appear in any guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionSet<K: FieldKey> {
    keys: BTreeSet<K>,
}

impl<K: FieldKey> Default for RedactionSet<K> {
    fn default() -> Self {
        Self {
            keys: BTreeSet::new(),
        }
    }
}

impl<K: FieldKey> RedactionSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses stored key names. A name that does not belong to the section
    /// is rejected rather than ignored.
    pub fn parse_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.as_ref().trim();
            let key = K::parse(name).ok_or_else(|| GuideError::UnknownRedactionKey {
                section: K::SECTION,
                key: name.to_string(),
            })?;
            set.insert(key);
        }
        Ok(set)
    }

    pub fn insert(&mut self, key: K) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: K) -> bool {
        self.keys.remove(&key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.keys.contains(&key)
    }

    /// True when `key` is redacted directly or through its group.
    pub fn covers(&self, key: K) -> bool {
        self.keys.contains(&key) || key.group().is_some_and(|group| self.keys.contains(&group))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }
}

impl<K: FieldKey> FromIterator<K> for RedactionSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// One named bucket of a care record.
#[derive(Debug, Clone)]
pub struct Section<F: SectionFields> {
    pub fields: F,
    pub notes: Option<String>,
    pub redacted: RedactionSet<F::Key>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<F: SectionFields> Default for Section<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F: SectionFields> Section<F> {
    pub fn new(fields: F) -> Self {
        Self {
            fields,
            notes: None,
            redacted: RedactionSet::new(),
            updated_at: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_redacted(mut self, key: F::Key) -> Self {
        self.redacted.insert(key);
        self
    }

    pub fn value(&self, key: F::Key) -> &FieldValue {
        self.fields.value(key)
    }

    /// Notes text, if any is worth printing.
    pub fn notes_text(&self) -> Option<String> {
        self.notes.as_deref().and_then(normalize)
    }

    pub(crate) fn from_parts(
        fields: Option<F>,
        notes: Option<String>,
        redacted: Option<Vec<String>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        Ok(Self {
            fields: fields.unwrap_or_default(),
            notes,
            redacted: RedactionSet::parse_names(redacted.unwrap_or_default())?,
            updated_at,
        })
    }
}

/// Declares a section's field struct together with its key enum.
///
/// Each field is `name => Variant = "Label"`, optionally followed by
/// `as list` for list-typed fields and `in Group` when the field belongs to a
/// group key declared under `groups`.
macro_rules! section_fields {
    (@group) => {
        None
    };
    (@group $group:ident) => {
        Some(Self::$group)
    };
    (@list) => {
        false
    };
    (@list list) => {
        true
    };
    (
        $(#[$meta:meta])*
        pub struct $fields:ident / $key:ident : $section:literal {
            $( $field:ident => $variant:ident = $label:literal $(as $shape:ident)? $(in $group:ident)? ),* $(,)?
        }
        $( groups { $( $gvariant:ident => $gname:literal = $glabel:literal ),* $(,)? } )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $fields {
            $( pub $field: $crate::schema::FieldValue, )*
        }

        impl<'de> serde::Deserialize<'de> for $fields {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let raw = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                let mut map = $crate::schema::field_map($section, raw);
                Ok(Self {
                    $( $field: $crate::schema::FieldValue::take(&mut map, $key::$variant), )*
                })
            }
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $key {
            $( $variant, )*
            $( $( $gvariant, )* )?
        }

        impl $crate::schema::FieldKey for $key {
            const SECTION: &'static str = $section;
            const ALL: &'static [Self] = &[ $( Self::$variant, )* $( $( Self::$gvariant, )* )? ];

            fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($field), )*
                    $( $( Self::$gvariant => $gname, )* )?
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )*
                    $( $( Self::$gvariant => $glabel, )* )?
                }
            }

            fn group(self) -> Option<Self> {
                match self {
                    $( Self::$variant => $crate::schema::section_fields!(@group $($group)?), )*
                    $( $( Self::$gvariant => None, )* )?
                }
            }

            fn is_list(self) -> bool {
                match self {
                    $( Self::$variant => $crate::schema::section_fields!(@list $($shape)?), )*
                    $( $( Self::$gvariant => false, )* )?
                }
            }
        }

        impl $crate::schema::SectionFields for $fields {
            type Key = $key;

            fn value(&self, key: $key) -> &$crate::schema::FieldValue {
                match key {
                    $( $key::$variant => &self.$field, )*
                    #[allow(unreachable_patterns)]
                    _ => &$crate::schema::ABSENT,
                }
            }
        }
    };
}

pub(crate) use section_fields;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{HealthKey, HomeBaseKey};

    #[test]
    fn test_display_joins_lists() {
        let value = FieldValue::list(["peanuts", " ", "tree nuts"]);
        assert_eq!(value.display().as_deref(), Some("peanuts, tree nuts"));
    }

    #[test]
    fn test_display_blank_is_empty() {
        assert!(FieldValue::text("   ").is_empty());
        assert!(FieldValue::list(Vec::<String>::new()).is_empty());
        assert!(FieldValue::Absent.is_empty());
    }

    #[test]
    fn test_display_folds_line_breaks() {
        let value = FieldValue::text("line one\n## not a header");
        assert_eq!(value.display().as_deref(), Some("line one ## not a header"));
    }

    #[test]
    fn test_malformed_values_degrade_to_absent() {
        let value: FieldValue = serde_json::from_str(r#"{"nested": true}"#).unwrap();
        assert_eq!(value, FieldValue::Absent);
        let value: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(value, FieldValue::Absent);
        let value: FieldValue = serde_json::from_str(r#"["milk", {"x": 1}, 7]"#).unwrap();
        assert_eq!(value, FieldValue::list(["milk", "7"]));
    }

    #[test]
    fn test_list_field_rejects_bare_text() {
        assert_eq!(
            FieldValue::from_json_list(Value::from("peanuts")),
            FieldValue::Absent
        );
        assert_eq!(FieldValue::from_json_list(Value::from(3)), FieldValue::Absent);
        assert_eq!(
            FieldValue::from_json_list(serde_json::json!(["peanuts"])),
            FieldValue::list(["peanuts"])
        );
    }

    #[test]
    fn test_take_decodes_by_field_shape() {
        let mut map = field_map(
            "health",
            serde_json::json!({"allergies": "peanuts", "insurance": "Acme"}),
        );
        assert_eq!(FieldValue::take(&mut map, HealthKey::Allergies), FieldValue::Absent);
        assert_eq!(
            FieldValue::take(&mut map, HealthKey::Insurance),
            FieldValue::text("Acme")
        );
        assert!(map.is_empty());
        assert!(field_map("health", Value::from("oops")).is_empty());
    }

    #[test]
    fn test_default_section_is_empty() {
        let section = Section::<crate::record::RoutinesFields>::default();
        assert!(section.redacted.is_empty());
        assert!(section.notes.is_none());
        assert!(section.updated_at.is_none());
    }

    #[test]
    fn test_parse_names_rejects_unknown_keys() {
        let set = RedactionSet::<HealthKey>::parse_names(["allergies", "medications"]).unwrap();
        assert!(set.contains(HealthKey::Allergies));
        assert!(set.contains(HealthKey::Medications));

        let err = RedactionSet::<HealthKey>::parse_names(["alergies"]).unwrap_err();
        assert!(matches!(
            err,
            GuideError::UnknownRedactionKey { section: "health", .. }
        ));
    }

    #[test]
    fn test_group_key_covers_members() {
        let set: RedactionSet<HomeBaseKey> = [HomeBaseKey::Wifi].into_iter().collect();
        assert!(set.covers(HomeBaseKey::WifiNetwork));
        assert!(set.covers(HomeBaseKey::WifiPassword));
        assert!(!set.covers(HomeBaseKey::DoorCode));
        assert!(!set.contains(HomeBaseKey::WifiNetwork));
    }

    #[test]
    fn test_key_names_round_trip_through_parse() {
        for key in HomeBaseKey::ALL {
            assert_eq!(HomeBaseKey::parse(key.as_str()), Some(*key));
        }
    }
}
