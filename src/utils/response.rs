use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::utils::pagination::Pagination;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(flatten)]
    pub fallbacks: Map<String, Value>,
}

pub fn success<T>(data: T, message: impl Into<String>) -> impl IntoResponse
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    };
    (StatusCode::OK, Json(body))
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    upstream_status: Option<u16>,
    details: Option<Value>,
    fallbacks: &[&str],
    status: StatusCode,
) -> Response {
    let fallbacks = fallbacks
        .iter()
        .map(|key| (key.to_string(), Value::Array(Vec::new())))
        .collect();

    let body = ApiErrorBody {
        error: message.into(),
        code: code.to_string(),
        status: upstream_status,
        details,
        fallbacks,
    };

    (status, Json(body)).into_response()
}

/// A collection response. The rows are written under the entity's plural
/// key and again under `results` and `items`, so every client reads the
/// same shape regardless of which key it was written against.
pub struct ListEnvelope<T> {
    pub plural: &'static str,
    pub rows: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> ListEnvelope<T> {
    pub fn new(plural: &'static str, rows: Vec<T>) -> Self {
        Self {
            plural,
            rows,
            pagination: None,
        }
    }

    pub fn paginated(plural: &'static str, rows: Vec<T>, pagination: Pagination) -> Self {
        Self {
            plural,
            rows,
            pagination: Some(pagination),
        }
    }
}

impl<T: Serialize> Serialize for ListEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(self.plural, &self.rows)?;
        if self.plural != "results" {
            map.serialize_entry("results", &self.rows)?;
        }
        if self.plural != "items" {
            map.serialize_entry("items", &self.rows)?;
        }
        if let Some(pagination) = &self.pagination {
            map.serialize_entry("pagination", pagination)?;
        }
        map.end()
    }
}

impl<T: Serialize> IntoResponse for ListEnvelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_repeats_rows_under_every_key() {
        let envelope = ListEnvelope::new("teams", vec!["a", "b"]);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["teams"], serde_json::json!(["a", "b"]));
        assert_eq!(value["results"], value["teams"]);
        assert_eq!(value["items"], value["teams"]);
        assert!(value.get("pagination").is_none());
    }

    #[test]
    fn list_envelope_includes_pagination_when_present() {
        let pagination = Pagination::new(1, 10, 3);
        let envelope = ListEnvelope::paginated("sports", vec![1, 2, 3], pagination);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["pagination"]["total"], 3);
        assert_eq!(value["pagination"]["next_page"], Value::Null);
    }
}
