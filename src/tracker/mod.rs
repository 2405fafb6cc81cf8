pub mod dry_run;
pub mod gh;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{TrackerConfig, TrackerKind};
use crate::error::SyncError;
use crate::model::issue::{CreatedIssue, IssueEdit, IssueRef, LabelSpec, LabelStatus, NewIssue};

/// The remote issue tracker. Every call is a full round trip; callers await
/// each one before issuing the next.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    fn name(&self) -> &str;

    async fn label_exists(&self, name: &str) -> Result<bool>;

    async fn create_label(&self, label: &LabelSpec) -> Result<()>;

    /// Create the label unless the tracker already has it.
    async fn ensure_label(&self, label: &LabelSpec) -> Result<LabelStatus> {
        if self.label_exists(&label.name).await? {
            return Ok(LabelStatus::Existed);
        }
        self.create_label(label).await?;
        Ok(LabelStatus::Created)
    }

    /// Search for an issue titled exactly `title`. Only the top search hit is
    /// considered; a hit with a different title counts as not found.
    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<()>;
}


pub fn create_tracker(config: &TrackerConfig) -> Result<Box<dyn TrackerClient>, SyncError> {
    match config.kind {
        TrackerKind::Gh => Ok(Box::new(gh::GhTracker::new(
            config.gh_bin.clone(),
            config.repo.clone(),
        ))),
        TrackerKind::GithubApi => {
            let repo = config.repo.clone().ok_or_else(|| {
                SyncError::Config("tracker.repo is required for the github-api tracker".into())
            })?;
            let token = config
                .token
                .clone()
                .or_else(|| std::env::var("GITHUB_TOKEN").ok())
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    SyncError::Config(
                        "github-api tracker needs tracker.token or GITHUB_TOKEN".into(),
                    )
                })?;
            Ok(Box::new(rest::RestTracker::new(
                config.api_url.clone(),
                repo,
                token,
            )?))
        }
    }
}

/// Pick the search hit whose title matches exactly.
pub(crate) fn exact_match(hit: Option<IssueRef>, title: &str) -> Option<IssueRef> {
    hit.filter(|issue| issue.title == title)
}
