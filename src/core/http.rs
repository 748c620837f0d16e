//! HTTP implementation of the backend seam
//!
//! Blocking `reqwest` client; every call runs to completion before the next
//! one starts, which is what the sequential importer relies on.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::core::api::{ApiError, Backend, Resource};
use crate::core::inventory::InventoryRow;
use crate::entities::spool::Spool;

/// Page size used when walking `skip`/`limit` list endpoints
const PAGE_SIZE: usize = 100;

/// Backend client speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
                message: "not an http(s) base URL".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "not an http(s) base URL".to_string(),
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = check(request.send()?)?;
        Ok(response.json::<T>()?)
    }
}

/// Turn a non-success response into `ApiError::Backend`
fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "backend rejected request");
    Err(ApiError::Backend {
        status: status.as_u16(),
        detail: extract_detail(&body, status),
    })
}

/// Pull the service's `detail` message out of an error body
///
/// Validation failures carry a list of `{loc, msg}` objects instead of a
/// string; those are flattened to `loc.path: msg` pairs.
pub(crate) fn extract_detail(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(format_validation_entry)
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => body.trim().to_string(),
        },
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

fn format_validation_entry(entry: &Value) -> String {
    let msg = entry
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or("invalid value");
    let loc = entry
        .get("loc")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();
    if loc.is_empty() {
        msg.to_string()
    } else {
        format!("{}: {}", loc, msg)
    }
}

impl Backend for HttpBackend {
    fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        let url = self.endpoint(&[R::PATH], true)?;
        let mut records: Vec<R> = Vec::new();
        loop {
            tracing::debug!(url = %url, skip = records.len(), "GET");
            let page: Vec<R> = self.send(
                self.client
                    .get(url.clone())
                    .query(&[("skip", records.len()), ("limit", PAGE_SIZE)]),
            )?;
            let fetched = page.len();
            records.extend(page);
            if fetched < PAGE_SIZE {
                break;
            }
        }
        Ok(records)
    }

    fn get<R: Resource>(&self, id: i64) -> Result<R, ApiError> {
        let url = self.endpoint(&[R::PATH, &id.to_string()], false)?;
        tracing::debug!(url = %url, "GET");
        self.send(self.client.get(url))
    }

    fn create<R: Resource>(&self, body: &R::Create) -> Result<R, ApiError> {
        let url = self.endpoint(&[R::PATH], true)?;
        tracing::debug!(url = %url, ?body, "POST");
        self.send(self.client.post(url).json(body))
    }

    fn update<R: Resource>(&self, id: i64, body: &R::Update) -> Result<R, ApiError> {
        let url = self.endpoint(&[R::PATH, &id.to_string()], false)?;
        tracing::debug!(url = %url, ?body, "PUT");
        self.send(self.client.put(url).json(body))
    }

    fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&[R::PATH, &id.to_string()], false)?;
        tracing::debug!(url = %url, "DELETE");
        check(self.client.delete(url).send()?)?;
        Ok(())
    }

    fn spools_for_filament(&self, filament_name: &str) -> Result<Vec<Spool>, ApiError> {
        let url = self.endpoint(&[Spool::PATH, "by-filament", filament_name], false)?;
        tracing::debug!(url = %url, "GET");
        self.send(self.client.get(url))
    }

    fn inventory_summary(&self) -> Result<Vec<InventoryRow>, ApiError> {
        let url = self.endpoint(&["inventory", "summary"], false)?;
        tracing::debug!(url = %url, "GET");
        self.send(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::vendor::Vendor;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_collection_endpoint_has_trailing_slash() {
        let api = backend("http://localhost:8000");
        let url = api.endpoint(&[Vendor::PATH], true).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/vendors/");
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let api = backend("http://example.com/api/");
        let url = api.endpoint(&["purchase-items", "12"], false).unwrap();
        assert_eq!(url.as_str(), "http://example.com/api/purchase-items/12");
    }

    #[test]
    fn test_filament_name_is_percent_encoded() {
        let api = backend("http://localhost:8000");
        let url = api
            .endpoint(&["spools", "by-filament", "eSUN PLA+ White"], false)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/spools/by-filament/eSUN%20PLA+%20White"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(HttpBackend::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
        assert!(HttpBackend::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_extract_string_detail() {
        let body = r#"{"detail": "Vendor already exists"}"#;
        assert_eq!(
            extract_detail(body, StatusCode::BAD_REQUEST),
            "Vendor already exists"
        );
    }

    #[test]
    fn test_extract_validation_detail() {
        let body = r#"{"detail": [{"loc": ["body", "name"], "msg": "field required", "type": "value_error.missing"}]}"#;
        assert_eq!(
            extract_detail(body, StatusCode::UNPROCESSABLE_ENTITY),
            "body.name: field required"
        );
    }

    #[test]
    fn test_extract_detail_falls_back_to_reason() {
        assert_eq!(extract_detail("", StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(
            extract_detail("upstream timeout", StatusCode::BAD_GATEWAY),
            "upstream timeout"
        );
    }
}
