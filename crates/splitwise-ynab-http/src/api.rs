use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

const TIMEOUT: Duration = Duration::from_secs(30);

/// A JSON API behind a bearer token.
#[derive(Clone)]
pub(crate) struct ApiClient {
    client: Client,
    api_base: String,
    token: String,
}

impl ApiClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("splitwise-ynab/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}/{}", self.api_base, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).with_context(|| format!("Invalid API url: {raw}"))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path, query)?;
        tracing::debug!("GET {url}");
        self.send(self.client.get(url))
    }

    pub fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path, &[])?;
        tracing::debug!("POST {url}");
        self.send(self.client.post(url).json(body))
    }

    pub fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path, &[])?;
        tracing::debug!("PUT {url}");
        self.send(self.client.put(url).json(body))
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.token).send()?;
        let url = response.url().clone();
        let response = check_status(response)?;
        response
            .json()
            .with_context(|| format!("Failed to decode response from {url}"))
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().unwrap_or_default();
    bail!("{status} from {url}: {body}")
}
