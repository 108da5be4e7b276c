use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Record;

/// `GET /api/data` response. Only `data` is required by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiFeed {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub data: Vec<ApiItem>,
}

/// One raw feed item. Field names inside `fields` are source-table column
/// names ("Название", "Источник", "Дата", ...), so they stay untyped here and
/// are resolved by the normalizer's rule table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiItem {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub fields: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl ApiItem {
    /// First present, non-null value among `keys`.
    pub fn field(&self, keys: &[&str]) -> Option<&Value> {
        let fields = self.fields.as_ref()?.as_object()?;
        keys.iter()
            .filter_map(|k| fields.get(*k))
            .find(|v| !v.is_null())
    }

    /// Source-provided identifier, if it is a non-empty string or a number.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// `POST /chat` body. `context` is the currently filtered record set.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
    pub context: &'a [Record],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feed_tolerates_missing_envelope_fields() {
        let feed: ApiFeed = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(feed.data.is_empty());
        assert!(feed.total.is_none());

        let feed: ApiFeed = serde_json::from_value(json!({})).unwrap();
        assert!(feed.data.is_empty());
    }

    #[test]
    fn test_field_lookup_skips_nulls_and_non_objects() {
        let item: ApiItem = serde_json::from_value(json!({
            "id": "vk_0",
            "fields": { "Название": null, "Title": "fallback" }
        }))
        .unwrap();
        assert_eq!(item.field(&["Название", "Title"]), Some(&json!("fallback")));
        assert_eq!(item.id_string().as_deref(), Some("vk_0"));

        let broken: ApiItem = serde_json::from_value(json!({ "fields": 42 })).unwrap();
        assert!(broken.field(&["Название"]).is_none());
        assert!(broken.id_string().is_none());
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let item: ApiItem = serde_json::from_value(json!({ "id": 17, "fields": {} })).unwrap();
        assert_eq!(item.id_string().as_deref(), Some("17"));
    }
}
