//! Disease knowledge-base loading.
//!
//! The corpus file is a single JSON object mapping a record key to a record
//! body. Records keep their file order end to end; the row number assigned
//! here is the join key between the vector index and record metadata, so
//! load order is an invariant, not an accident.

use std::path::Path;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RagError;

/// JSON field holding the record key once flattened into the record itself.
pub const KEY_FIELD: &str = "anahtar";

/// Fields emitted first when building search text. Long records get cut off
/// by the embedding model's input window, so these must come before the rest.
const PRIORITY_FIELDS: [&str; 6] = [
    "hastalık_adı",
    "belirtiler",
    "semptomlar",
    "açıklama",
    "tanı",
    "tedavi",
];

/// One entry of the knowledge base: its key plus the record body in file
/// order. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRecord {
    pub key: String,
    pub fields: Map<String, Value>,
}

impl CorpusRecord {
    /// Flatten the record into one searchable string. Priority fields come
    /// first in their fixed order, then every remaining field in record
    /// order. Scalars render as `field: value`, lists as `field: a b c`.
    pub fn search_text(&self) -> String {
        let mut parts = Vec::new();

        for field in PRIORITY_FIELDS {
            if let Some(value) = self.fields.get(field) {
                if let Some(rendered) = render_value(value) {
                    parts.push(format!("{field}: {rendered}"));
                }
            }
        }

        for (field, value) in &self.fields {
            if PRIORITY_FIELDS.contains(&field.as_str()) || field == KEY_FIELD {
                continue;
            }
            if let Some(rendered) = render_value(value) {
                parts.push(format!("{field}: {rendered}"));
            }
        }

        parts.join(" ")
    }
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(render_scalar)
                .collect::<Vec<_>>()
                .join(" ");
            Some(joined)
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Serialized form puts the key back under "anahtar", ahead of the body
// fields, so API payloads show the record exactly as the corpus file plus
// its key.
impl Serialize for CorpusRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(KEY_FIELD, &self.key)?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CorpusRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::deserialize(deserializer)?;
        let key = match fields.remove(KEY_FIELD) {
            Some(Value::String(key)) => key,
            Some(_) => {
                return Err(de::Error::custom(format!("{KEY_FIELD} must be a string")));
            }
            None => return Err(de::Error::missing_field(KEY_FIELD)),
        };
        Ok(Self { key, fields })
    }
}

/// Read the corpus file and flatten it into an ordered record list.
///
/// A missing file and malformed JSON are both fatal; the caller has no index
/// to serve without a corpus.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusRecord>, RagError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RagError::CorpusMissing(path.to_path_buf())
        } else {
            RagError::Io(e)
        }
    })?;

    let top: Map<String, Value> = serde_json::from_str(&raw)
        .map_err(|e| RagError::CorpusMalformed(e.to_string()))?;

    let mut records = Vec::with_capacity(top.len());
    for (key, value) in top {
        match value {
            Value::Object(fields) => records.push(CorpusRecord { key, fields }),
            _ => {
                return Err(RagError::CorpusMalformed(format!(
                    "entry {key:?} is not an object"
                )));
            }
        }
    }

    tracing::debug!(records = records.len(), path = %path.display(), "corpus loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, body: Value) -> CorpusRecord {
        let Value::Object(fields) = body else {
            panic!("test body must be an object");
        };
        CorpusRecord {
            key: key.to_string(),
            fields,
        }
    }

    fn write_corpus(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("hastaliklar.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn load_preserves_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(
            dir.path(),
            r#"{"zona": {"belirtiler": "ağrı"}, "anemi": {"belirtiler": "halsizlik"}, "grip": {"belirtiler": "ateş"}}"#,
        );

        let records = load_corpus(&path).unwrap();
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["zona", "anemi", "grip"]);
    }

    #[test]
    fn missing_file_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(&dir.path().join("yok.json")).unwrap_err();
        assert!(matches!(err, RagError::CorpusMissing(_)));
    }

    #[test]
    fn malformed_json_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), "{not json");
        assert!(matches!(
            load_corpus(&path).unwrap_err(),
            RagError::CorpusMalformed(_)
        ));
    }

    #[test]
    fn non_object_entry_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_corpus(dir.path(), r#"{"grip": "sadece metin"}"#);
        assert!(matches!(
            load_corpus(&path).unwrap_err(),
            RagError::CorpusMalformed(_)
        ));
    }

    #[test]
    fn search_text_puts_priority_fields_first() {
        let rec = record(
            "migren",
            json!({
                "kaynak": "el kitabı",
                "belirtiler": ["baş ağrısı", "bulantı"],
                "hastalık_adı": "Migren"
            }),
        );

        let text = rec.search_text();
        assert_eq!(
            text,
            "hastalık_adı: Migren belirtiler: baş ağrısı bulantı kaynak: el kitabı"
        );
    }

    #[test]
    fn search_text_skips_key_field_and_renders_numbers() {
        let rec = record(
            "grip",
            json!({
                "görülme_sıklığı": 12,
                "açıklama": "viral enfeksiyon"
            }),
        );

        let text = rec.search_text();
        assert_eq!(text, "açıklama: viral enfeksiyon görülme_sıklığı: 12");
        assert!(!text.contains(KEY_FIELD));
    }

    #[test]
    fn serialized_record_leads_with_its_key() {
        let rec = record("grip", json!({"belirtiler": "ateş"}));
        let out = serde_json::to_string(&rec).unwrap();
        assert!(out.starts_with(r#"{"anahtar":"grip""#), "got {out}");

        let back: CorpusRecord = serde_json::from_str(&out).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn deserialize_requires_the_key_field() {
        let err = serde_json::from_str::<CorpusRecord>(r#"{"belirtiler": "ateş"}"#);
        assert!(err.is_err());
    }
}
