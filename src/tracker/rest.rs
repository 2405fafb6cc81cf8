use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{exact_match, TrackerClient};
use crate::error::SyncError;
use crate::model::issue::{CreatedIssue, IssueEdit, IssueRef, LabelSpec, NewIssue};

/// GitHub REST v3 backend for machines without `gh`.
pub struct RestTracker {
    base_url: String,
    repo: String,
    token: String,
    client: reqwest::Client,
}

impl RestTracker {
    pub fn new(base_url: String, repo: String, token: String) -> Result<Self, SyncError> {
        if repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(SyncError::Config(format!(
                "tracker.repo must look like owner/name, got '{repo}'"
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("backlog-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            repo,
            token,
            client,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{path}", self.base_url, self.repo)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        tracing::debug!(method = method.as_str(), url = url.as_str(), "github api request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<IssueRef>,
}

#[derive(Deserialize)]
struct CreatedResponse {
    number: u64,
    html_url: Option<String>,
}

fn search_query(repo: &str, title: &str) -> String {
    format!("repo:{repo} is:issue in:title \"{}\"", title.replace('"', ""))
}

async fn ensure_success(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("GitHub {what} failed ({status}): {}", body.trim())
}

#[async_trait]
impl TrackerClient for RestTracker {
    fn name(&self) -> &str {
        "github-api"
    }

    async fn label_exists(&self, name: &str) -> Result<bool> {
        let url = self.repo_url(&format!("labels/{}", urlencoding::encode(name)));
        let resp = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .context("GitHub label lookup request failed")?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(resp, "label lookup").await?;
        Ok(true)
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<()> {
        let resp = self
            .request(reqwest::Method::POST, self.repo_url("labels"))
            .json(label)
            .send()
            .await
            .context("GitHub label create request failed")?;
        ensure_success(resp, "label create").await?;
        Ok(())
    }

    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>> {
        let url = format!("{}/search/issues", self.base_url);
        let query = search_query(&self.repo, title);
        let resp = self
            .request(reqwest::Method::GET, url)
            .query(&[("q", query.as_str()), ("per_page", "1")])
            .send()
            .await
            .context("GitHub issue search request failed")?;
        let search: SearchResponse = ensure_success(resp, "issue search")
            .await?
            .json()
            .await
            .context("Failed to parse GitHub search response")?;
        Ok(exact_match(search.items.into_iter().next(), title))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let resp = self
            .request(reqwest::Method::POST, self.repo_url("issues"))
            .json(issue)
            .send()
            .await
            .context("GitHub issue create request failed")?;
        let created: CreatedResponse = ensure_success(resp, "issue create")
            .await?
            .json()
            .await
            .context("Failed to parse GitHub issue create response")?;
        Ok(CreatedIssue {
            number: Some(created.number),
            url: created.html_url,
        })
    }

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<()> {
        let (method, path, payload) = match edit {
            IssueEdit::AddLabel(name) => (
                reqwest::Method::POST,
                format!("issues/{number}/labels"),
                serde_json::json!({ "labels": [name] }),
            ),
            IssueEdit::AddAssignee(login) => (
                reqwest::Method::POST,
                format!("issues/{number}/assignees"),
                serde_json::json!({ "assignees": [login] }),
            ),
            IssueEdit::ReplaceBody(body) => (
                reqwest::Method::PATCH,
                format!("issues/{number}"),
                serde_json::json!({ "body": body }),
            ),
        };
        let resp = self
            .request(method, self.repo_url(&path))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("GitHub request to {} failed", edit.describe()))?;
        ensure_success(resp, &edit.describe()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_repo() {
        let result = RestTracker::new("https://api.github.com".into(), "widgets".into(), "t".into());
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn repo_url_strips_trailing_slash() {
        let tracker =
            RestTracker::new("https://ghe.example.com/api/v3/".into(), "acme/widgets".into(), "t".into())
                .unwrap();
        assert_eq!(
            tracker.repo_url("issues"),
            "https://ghe.example.com/api/v3/repos/acme/widgets/issues"
        );
    }

    #[test]
    fn search_query_scopes_to_repo_and_title() {
        assert_eq!(
            search_query("acme/widgets", "BL-1: Fix \"bug\""),
            "repo:acme/widgets is:issue in:title \"BL-1: Fix bug\""
        );
    }

    #[test]
    fn search_response_without_items_is_empty() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"total_count":0}"#).unwrap();
        assert!(parsed.items.is_empty());
    }
}
