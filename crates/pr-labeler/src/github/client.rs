//! # GitHub API client
//!
//! `reqwest` implementation of [`RepoService`] against the REST v3 endpoints
//! plus one GraphQL query. Every call is attempted once; a 404 is mapped to
//! [`LabelerError::NotFound`] and any other failure status to
//! [`LabelerError::Api`].

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::graphql::{GraphQlResponse, Query, ReviewDecisionQuery};
use super::types::{ChangedFile, IssueLabel, ReviewDecision};
use super::{RepoRef, RepoService};
use crate::error::{LabelerError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const PER_PAGE: usize = 100;
/// The files endpoint stops at 3000 entries.
const MAX_PAGES: usize = 30;

/// GitHub API client bound to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    api_url: String,
    graphql_url: String,
    repo: RepoRef,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubClient {
    /// Create a client for `repo` authenticated with `token`.
    pub fn new(token: &str, repo: RepoRef) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-labeler/1.0"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| LabelerError::Config("GitHub token is not a valid header".into()))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            repo,
        })
    }

    /// Point REST calls at another host (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Point GraphQL calls at another endpoint.
    #[must_use]
    pub fn with_graphql_url(mut self, graphql_url: &str) -> Self {
        self.graphql_url = graphql_url.to_string();
        self
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.repo.owner, self.repo.name, path
        )
    }

    /// Send a request and map failure statuses onto [`LabelerError`].
    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(LabelerError::NotFound(resource.to_string()));
        }

        let message = match response.json::<GitHubErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(LabelerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Collect every page of a list endpoint.
    async fn get_paginated<T>(&self, url: &str, resource: &str) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let request = self.http_client.get(url).query(&[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ]);
            let batch: Vec<T> = self.send(request, resource).await?.json().await?;
            let last_page = batch.len() < PER_PAGE;
            items.extend(batch);
            if last_page {
                break;
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl RepoService for GitHubClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>> {
        let url = self.repo_url(&format!("pulls/{number}/files"));
        let files: Vec<ChangedFile> = self
            .get_paginated(&url, &format!("files of pull request #{number}"))
            .await?;
        debug!(count = files.len(), "Retrieved changed files");
        Ok(files)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_labels(&self, number: u64) -> Result<Vec<IssueLabel>> {
        let url = self.repo_url(&format!("issues/{number}/labels"));
        let labels: Vec<IssueLabel> = self
            .get_paginated(&url, &format!("labels of issue #{number}"))
            .await?;
        debug!(count = labels.len(), "Retrieved issue labels");
        Ok(labels)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn add_labels(&self, number: u64, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let url = self.repo_url(&format!("issues/{number}/labels"));
        let body = serde_json::json!({ "labels": names });
        self.send(
            self.http_client.post(&url).json(&body),
            &format!("issue #{number}"),
        )
        .await?;

        info!(count = names.len(), "Added labels to issue #{}", number);
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn remove_label(&self, number: u64, name: &str) -> Result<()> {
        let url = self.repo_url(&format!(
            "issues/{number}/labels/{}",
            urlencoding::encode(name)
        ));
        self.send(
            self.http_client.delete(&url),
            &format!("label '{name}' on issue #{number}"),
        )
        .await?;

        debug!("Removed label '{}' from issue #{}", name, number);
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_label(&self, name: &str) -> Result<IssueLabel> {
        let url = self.repo_url(&format!("labels/{}", urlencoding::encode(name)));
        let label = self
            .send(self.http_client.get(&url), &format!("label '{name}'"))
            .await?
            .json()
            .await?;
        Ok(label)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn create_label(&self, name: &str, color: &str) -> Result<IssueLabel> {
        let url = self.repo_url("labels");
        let body = serde_json::json!({ "name": name, "color": color });
        let label = self
            .send(self.http_client.post(&url).json(&body), "labels")
            .await?
            .json()
            .await?;

        info!("Created label '{}' with color {}", name, color);
        Ok(label)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<ChangedFile>> {
        let url = self.repo_url(&format!("compare/{base}...{head}"));
        let compare: CompareResponse = self
            .send(
                self.http_client.get(&url),
                &format!("comparison {base}...{head}"),
            )
            .await?
            .json()
            .await?;
        Ok(compare.files)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_file_content(&self, path: &str) -> Result<String> {
        let url = self.repo_url(&format!("contents/{}", path.trim_start_matches('/')));
        let content: ContentResponse = self
            .send(self.http_client.get(&url), &format!("file '{path}'"))
            .await?
            .json()
            .await?;

        let Some(encoded) = content.content else {
            return Ok(String::new());
        };
        if content.encoding.as_deref().is_some_and(|e| e != "base64") {
            return Ok(encoded);
        }

        // The API wraps the base64 body at 60 columns.
        let compact: String = encoded.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| LabelerError::Decode(format!("{path}: {e}")))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn review_decision(&self, number: u64) -> Result<Option<ReviewDecision>> {
        let query = ReviewDecisionQuery {
            owner: self.repo.owner.clone(),
            name: self.repo.name.clone(),
            number,
        };

        let response: GraphQlResponse<<ReviewDecisionQuery as Query>::Response> = self
            .send(
                self.http_client.post(&self.graphql_url).json(&query.request()),
                "graphql",
            )
            .await?
            .json()
            .await?;

        let decision = response.into_data()?.decision(number)?;
        debug!(?decision, "Fetched review decision");
        Ok(decision)
    }
}
