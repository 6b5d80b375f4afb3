//! Profile store backed by a GitHub repository, through the REST contents API.
//!
//! Each profile is `clients/<id>.json` on the configured branch. Updates and deletes
//! carry the blob SHA of the current file, as the API requires.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::GitHubConfig;
use crate::profiles::models::ToneProfile;
use crate::profiles::store::{list_label, validate_id, ProfileStore, ProfileStoreError};

const GITHUB_API_BASE: &str = "https://api.github.com";
const CLIENTS_DIR: &str = "clients";

#[derive(Debug, Deserialize)]
struct ContentFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirEntry {
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Serialize)]
struct PutFileRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteFileRequest<'a> {
    message: String,
    sha: String,
    branch: &'a str,
}

impl From<reqwest::Error> for ProfileStoreError {
    fn from(e: reqwest::Error) -> Self {
        ProfileStoreError::Remote(e.to_string())
    }
}

pub struct GitHubProfileStore {
    client: Client,
    config: GitHubConfig,
    base_url: String,
}

impl GitHubProfileStore {
    pub fn new(config: GitHubConfig) -> Result<Self, ProfileStoreError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent("caption-api")
                .build()?,
            config,
            base_url: GITHUB_API_BASE.to_string(),
        })
    }

    /// Points the store at another host (used against mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.base_url.trim_end_matches('/'),
            self.config.repo,
            path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("token {}", self.config.token))
            .header("Accept", "application/vnd.github.v3+json")
    }

    fn file_path(id: &str) -> Result<String, ProfileStoreError> {
        validate_id(id)?;
        Ok(format!("{CLIENTS_DIR}/{id}.json"))
    }

    async fn get_file(&self, path: &str) -> Result<Option<ContentFile>, ProfileStoreError> {
        let response = self
            .authorized(self.client.get(self.contents_url(path)))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(ProfileStoreError::Remote(format!(
                "GitHub API error {} reading {path}",
                status.as_u16()
            ))),
        }
    }

    fn decode(file: &ContentFile) -> Result<ToneProfile, ProfileStoreError> {
        // The API wraps base64 payloads at 60 columns.
        let encoded: String = file
            .content
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| ProfileStoreError::Remote(format!("Invalid base64 content: {e}")))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[async_trait]
impl ProfileStore for GitHubProfileStore {
    async fn list(&self) -> Result<BTreeMap<String, String>, ProfileStoreError> {
        let response = self
            .authorized(self.client.get(self.contents_url(CLIENTS_DIR)))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;
        let entries: Vec<DirEntry> = match response.status() {
            StatusCode::NOT_FOUND => return Ok(BTreeMap::new()),
            status if status.is_success() => response.json().await?,
            status => {
                return Err(ProfileStoreError::Remote(format!(
                    "GitHub API error {} listing profiles",
                    status.as_u16()
                )))
            }
        };

        let mut profiles = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.kind != "dir") {
            let Some(id) = entry.name.strip_suffix(".json") else {
                continue;
            };
            let profile = match self.get_file(&format!("{CLIENTS_DIR}/{}", entry.name)).await {
                Ok(Some(file)) => Self::decode(&file)
                    .map_err(|e| warn!("Unreadable profile {}: {e}", entry.name))
                    .ok(),
                Ok(None) => None,
                Err(e) => {
                    warn!("Failed to read {}: {e}", entry.name);
                    None
                }
            };
            profiles.insert(id.to_string(), list_label(id, profile.as_ref()));
        }
        Ok(profiles)
    }

    async fn load(&self, id: &str) -> Result<Option<ToneProfile>, ProfileStoreError> {
        let path = Self::file_path(id)?;
        match self.get_file(&path).await? {
            Some(file) => Ok(Some(Self::decode(&file)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, profile: &ToneProfile) -> Result<(), ProfileStoreError> {
        let path = Self::file_path(id)?;
        let sha = self.get_file(&path).await?.map(|f| f.sha);
        let body = PutFileRequest {
            message: format!("Save client: {id}"),
            content: STANDARD.encode(serde_json::to_vec_pretty(profile)?),
            branch: &self.config.branch,
            sha,
        };

        let response = self
            .authorized(self.client.put(self.contents_url(&path)))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProfileStoreError::Remote(format!(
                "GitHub API error {} saving {path}; check the token's contents permission",
                response.status().as_u16()
            )));
        }
        info!("Saved profile {id} to {}@{}", self.config.repo, self.config.branch);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ProfileStoreError> {
        let path = Self::file_path(id)?;
        let Some(existing) = self.get_file(&path).await? else {
            return Ok(());
        };
        let body = DeleteFileRequest {
            message: format!("Delete client: {id}"),
            sha: existing.sha,
            branch: &self.config.branch,
        };

        let response = self
            .authorized(self.client.delete(self.contents_url(&path)))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProfileStoreError::Remote(format!(
                "GitHub API error {} deleting {path}",
                response.status().as_u16()
            )));
        }
        info!("Deleted profile {id}");
        Ok(())
    }
}
