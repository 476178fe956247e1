use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::config::StorageConfig;

/// A container/key pair parsed from a storage locator such as
/// `store://results/job123/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub bucket: String,
    pub key: String,
}

/// Split a storage URI into its container name and object key (or prefix).
/// The scheme is opaque; only the authority/path split matters here.
pub fn parse_storage_uri(uri: &str) -> Result<StoreLocation> {
    let parsed = Url::parse(uri).with_context(|| format!("Invalid storage uri: {}", uri))?;
    let bucket = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Storage uri has no container: {}", uri))?
        .to_string();
    let key = parsed.path().trim_start_matches('/').to_string();
    if key.is_empty() {
        anyhow::bail!("Storage uri has no object key or prefix: {}", uri);
    }
    Ok(StoreLocation { bucket, key })
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// Client for the result object store. Writes by the recognition service
/// are not synchronously visible, so "not found" is an expected answer,
/// reported as `None` rather than an error.
pub struct StoreClient {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl StoreClient {
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            anyhow::bail!(
                "Storage endpoint not configured. \
                 Set [storage] endpoint in meetscribe.toml"
            );
        }

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("MEETSCRIBE_STORAGE_KEY").context(
                "Storage API key not configured. \
                 Set [storage] api_key or MEETSCRIBE_STORAGE_KEY",
            )?
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("Storage endpoint cannot be a base URL"))?;
            segments.pop_if_empty();
            segments.push(bucket);
            segments.extend(key.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn list_url(&self, bucket: &str, prefix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("Storage endpoint cannot be a base URL"))?;
            segments.pop_if_empty();
            segments.push(bucket);
        }
        url.query_pairs_mut().append_pair("prefix", prefix);
        Ok(url)
    }

    /// Fetch an object by exact key. Returns `None` if the object does not
    /// exist (yet); any other failure is an error.
    pub fn fetch_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let url = self.object_url(bucket, key)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .with_context(|| format!("Failed to fetch object {}/{}", bucket, key))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("Object fetch failed for {}/{}", bucket, key))?;
        let bytes = response.bytes()?;
        Ok(Some(bytes.to_vec()))
    }

    /// List object names under a prefix, in the order the store returns them.
    pub fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let url = self.list_url(bucket, prefix)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .with_context(|| format!("Failed to list objects under {}/{}", bucket, prefix))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Object listing failed for {}/{}", bucket, prefix))?;
        let listing: ListResponse = response
            .json()
            .context("Failed to parse object listing response")?;
        Ok(listing.items.into_iter().map(|entry| entry.name).collect())
    }
}
