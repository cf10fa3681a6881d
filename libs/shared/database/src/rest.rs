use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// HTTP client for the upstream scheduling API that owns appointments,
/// providers and settings.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.upstream_url.trim_end_matches('/').to_string(),
            api_key: config.upstream_api_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.api_key.is_empty() {
            headers.insert("apikey", HeaderValue::from_str(&self.api_key)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
            );
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers()?);

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        Ok(req.send().await?)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("Upstream error ({}): {}", status, error_text);

        Err(match status.as_u16() {
            401 | 403 => anyhow!("Authentication error: {}", error_text),
            404 => anyhow!("Resource not found: {}", error_text),
            409 => anyhow!("Upstream rejected the change: {}", error_text),
            _ => anyhow!("API error ({}): {}", status, error_text),
        })
    }

    /// Send a request and decode the JSON body. Bodies wrapped as `{"data": ...}`
    /// are unwrapped first; bare bodies are decoded as-is.
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = Self::check(self.send(method, path, query, body).await?).await?;
        let value = response.json::<Value>().await?;
        Ok(serde_json::from_value(unwrap_data(value))?)
    }

    /// Like [`request`](Self::request) but maps a 404 to `Ok(None)`.
    pub async fn request_optional<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, query, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("{} returned 404", path);
            return Ok(None);
        }

        let response = Self::check(response).await?;
        let value = response.json::<Value>().await?;
        Ok(serde_json::from_value(unwrap_data(value))?)
    }

    /// Send a command whose response body is irrelevant.
    pub async fn execute(&self, method: Method, path: &str, body: Value) -> Result<()> {
        Self::check(self.send(method, path, &[], Some(body)).await?).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_data_envelopes_only() {
        assert_eq!(unwrap_data(json!({"data": [1, 2]})), json!([1, 2]));
        assert_eq!(unwrap_data(json!({"monday": null})), json!({"monday": null}));
        assert_eq!(unwrap_data(json!({"data": null})), Value::Null);
        assert_eq!(unwrap_data(json!([1])), json!([1]));
    }
}
