use anyhow::Result;
use async_trait::async_trait;

use super::TrackerClient;
use crate::model::issue::{CreatedIssue, IssueEdit, IssueRef, LabelSpec, LabelStatus, NewIssue};

/// Passes reads through to the real tracker and prints writes instead of
/// performing them.
pub struct DryRunTracker {
    inner: Box<dyn TrackerClient>,
}

impl DryRunTracker {
    pub fn new(inner: Box<dyn TrackerClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TrackerClient for DryRunTracker {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn label_exists(&self, name: &str) -> Result<bool> {
        self.inner.label_exists(name).await
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<()> {
        println!("Would create label '{}' (#{})", label.name, label.color);
        Ok(())
    }

    async fn ensure_label(&self, label: &LabelSpec) -> Result<LabelStatus> {
        if self.inner.label_exists(&label.name).await? {
            return Ok(LabelStatus::Existed);
        }
        self.create_label(label).await?;
        Ok(LabelStatus::Planned)
    }

    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>> {
        self.inner.find_issue_by_title(title).await
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        println!(
            "Would create '{}' with labels [{}] and assignees [{}]",
            issue.title,
            issue.labels.join(", "),
            issue.assignees.join(", ")
        );
        Ok(CreatedIssue {
            number: None,
            url: Some("(dry run)".into()),
        })
    }

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<()> {
        println!("Would {} on #{number}", edit.describe());
        Ok(())
    }
}
