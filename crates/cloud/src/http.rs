//! reqwest implementation of [`DeviceCloud`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value};

use crate::{DeviceCloud, FetchError};

const DEFAULT_BASE_URL: &str = "http://localhost:9000";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the vendor cloud.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl CloudConfig {
    /// Load from environment variables.
    ///
    /// | Variable             | Default                 |
    /// |----------------------|-------------------------|
    /// | `CLOUD_BASE_URL`     | `http://localhost:9000` |
    /// | `CLOUD_API_TOKEN`    | unset                   |
    /// | `CLOUD_TIMEOUT_SECS` | `15`                    |
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("CLOUD_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_token: std::env::var("CLOUD_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("CLOUD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Polls `GET {base_url}/devices/{id}/latest` with an optional bearer token.
pub struct HttpDeviceCloud {
    client: reqwest::Client,
    base_url: Url,
    config: CloudConfig,
}

impl HttpDeviceCloud {
    pub fn new(config: CloudConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| FetchError::InvalidBaseUrl(config.base_url.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// The device id is pushed as a single percent-encoded path segment.
    fn latest_url(&self, external_device_id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidBaseUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(["devices", external_device_id, "latest"]);
        Ok(url)
    }
}

#[async_trait]
impl DeviceCloud for HttpDeviceCloud {
    async fn fetch_latest(&self, external_device_id: &str) -> Result<Map<String, Value>, FetchError> {
        let mut request = self.client.get(self.latest_url(external_device_id)?);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout_secs)
            } else {
                FetchError::Request(e)
            }
        })?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        tracing::debug!(device = external_device_id, "Fetched latest sample");
        extract_sample(body)
    }
}

/// Accept either a bare sample object or one wrapped in `{"data": {...}}`.
pub fn extract_sample(body: Value) -> Result<Map<String, Value>, FetchError> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(inner)) => Ok(inner),
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(map)
            }
            None => Ok(map),
        },
        other => Err(FetchError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(base_url: &str) -> CloudConfig {
        CloudConfig {
            base_url: base_url.to_string(),
            api_token: None,
            timeout_secs: 1,
        }
    }

    #[test]
    fn latest_url_tolerates_trailing_slash() {
        let cloud = HttpDeviceCloud::new(config("https://cloud.example.com/api/")).unwrap();
        assert_eq!(
            cloud.latest_url("AB-12").unwrap().as_str(),
            "https://cloud.example.com/api/devices/AB-12/latest"
        );

        let cloud = HttpDeviceCloud::new(config("https://cloud.example.com")).unwrap();
        assert_eq!(
            cloud.latest_url("AB-12").unwrap().as_str(),
            "https://cloud.example.com/devices/AB-12/latest"
        );
    }

    #[test]
    fn device_id_cannot_escape_its_path_segment() {
        let cloud = HttpDeviceCloud::new(config("https://cloud.example.com/api")).unwrap();
        let url = cloud.latest_url("../admin?x=1#frag").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.example.com/api/devices/..%2Fadmin%3Fx=1%23frag/latest"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path_segments().unwrap().count(), 4);
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        for bad in ["not a url", "mailto:ops@example.com"] {
            let err = HttpDeviceCloud::new(config(bad)).err().unwrap();
            assert!(matches!(err, FetchError::InvalidBaseUrl(ref u) if u == bad), "{bad}");
        }
    }

    #[test]
    fn wrapped_and_bare_samples_are_accepted() {
        let wrapped = extract_sample(json!({"data": {"temp": 20.5}})).unwrap();
        assert_eq!(wrapped["temp"], 20.5);

        let bare = extract_sample(json!({"temp": 19.0, "hum": 40})).unwrap();
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn non_object_body_is_invalid_payload() {
        let err = extract_sample(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, FetchError::InvalidPayload(ref m) if m.contains("an array")));
    }

    #[test]
    fn error_display_http_status() {
        assert_eq!(
            FetchError::HttpStatus(503).to_string(),
            "Device cloud returned HTTP 503"
        );
    }

    #[tokio::test]
    async fn unreachable_cloud_reports_request_error() {
        // Port 9 (discard) on loopback is closed in test environments.
        let cloud = HttpDeviceCloud::new(config("http://127.0.0.1:9")).unwrap();
        let err = cloud.fetch_latest("dev-1").await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_) | FetchError::Timeout(_)));
    }
}
