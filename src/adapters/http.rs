use crate::error::{Result, UnsearchError};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

/// Thin JSON-over-HTTP client shared by the hosted adapters.
///
/// Non-success statuses become [`UnsearchError::Http`] carrying the body
/// verbatim; nothing is retried.
#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    backend: &'static str,
    client: reqwest::Client,
    base_url: String,
    headers: Vec<(&'static str, String)>,
}

/// Percent-encode one path segment.
pub(crate) fn segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

impl RestClient {
    pub(crate) fn new(backend: &'static str, base_url: &str, headers: Vec<(&'static str, String)>) -> Self {
        RestClient {
            backend,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("[{}] {} {}", self.backend, method, path);
        let mut req = self.client.request(method, &url);
        for (k, v) in &self.headers {
            req = req.header(*k, v);
        }
        req
    }

    async fn check(&self, resp: Response) -> Result<Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UnsearchError::Http {
                backend: self.backend,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    /// GET a JSON resource; a 404 is `Ok(None)`.
    pub(crate) async fn get(&self, path: &str) -> Result<Option<Value>> {
        let resp = self.request(Method::GET, path).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = self.check(resp).await?;
        Ok(Some(resp.json().await?))
    }

    pub(crate) async fn get_query(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self.request(Method::GET, path).query(query).send().await?;
        Ok(self.check(resp).await?.json().await?)
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send_json(Method::POST, path, body).await
    }

    pub(crate) async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.send_json(Method::PUT, path, body).await
    }

    async fn send_json(&self, method: Method, path: &str, body: &Value) -> Result<Value> {
        let resp = self.request(method, path).json(body).send().await?;
        Ok(self.check(resp).await?.json().await?)
    }

    /// POST a raw text body and return the raw text response.
    pub(crate) async fn post_text(&self, path: &str, body: String) -> Result<String> {
        let resp = self
            .request(Method::POST, path)
            .header("content-type", "text/plain")
            .body(body)
            .send()
            .await?;
        Ok(self.check(resp).await?.text().await?)
    }

    /// DELETE a resource; a 404 counts as already deleted.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let resp = self.request(Method::DELETE, path).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.check(resp).await?;
        Ok(())
    }
}
