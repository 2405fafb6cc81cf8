//! Label setup and row-by-row synchronization.

pub mod journal;
pub mod pacing;

use crate::error::{Result, SyncError};
use crate::model::backlog_row::{BacklogRow, Columns};
use crate::model::issue::{CreatedIssue, IssueEdit, LabelSpec, LabelStatus, NewIssue};
use crate::tracker::TrackerClient;

use journal::{new_entry, Journal, RowAction};
use pacing::Pacer;

/// Facts fixed before the first row is processed.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// The categorical label, present only when it exists in the tracker.
    pub label: Option<String>,
    pub columns: Columns,
    pub source_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Updated(u64),
    Created(CreatedIssue),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
}

pub struct Synchronizer<'a> {
    tracker: &'a dyn TrackerClient,
    pacer: Pacer,
    journal: Option<Journal>,
}

impl<'a> Synchronizer<'a> {
    pub fn new(tracker: &'a dyn TrackerClient, pacer: Pacer) -> Self {
        Self {
            tracker,
            pacer,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Make sure the categorical label exists. Returns whether it can be
    /// attached to issues; failure only degrades the run.
    pub async fn ensure_label(&self, label: &LabelSpec) -> bool {
        match self.tracker.ensure_label(label).await {
            Ok(LabelStatus::Existed) => {
                tracing::debug!(label = %label.name, "label already exists");
                true
            }
            Ok(LabelStatus::Created) => {
                println!("Created label '{}'", label.name);
                true
            }
            Ok(LabelStatus::Planned) => true,
            Err(e) => {
                eprintln!(
                    "Warning: could not create label '{}'; continuing without it",
                    label.name
                );
                tracing::warn!(label = %label.name, error = %format!("{e:#}"), "label setup failed");
                false
            }
        }
    }

    /// Process rows in order, pausing between them. Stops at the first row
    /// that cannot be read or whose issue cannot be created.
    pub async fn run<I>(&mut self, plan: &SyncPlan, rows: I) -> Result<SyncReport>
    where
        I: IntoIterator<Item = Result<BacklogRow>>,
    {
        let mut report = SyncReport::default();
        for (idx, row) in rows.into_iter().enumerate() {
            let row = row?;
            if idx > 0 {
                self.pacer.wait().await;
            }
            match self.sync_row(plan, &row).await? {
                RowOutcome::Updated(_) => report.updated += 1,
                RowOutcome::Created(_) => report.created += 1,
            }
        }
        Ok(report)
    }

    pub async fn sync_row(&self, plan: &SyncPlan, row: &BacklogRow) -> Result<RowOutcome> {
        let title = row.title();
        let body = row.body(&plan.source_note);
        println!("Processing: {title}");
        if !row.issue_link.is_empty() {
            tracing::debug!(row = %row.id, link = %row.issue_link, "issue_link is not used for matching");
        }

        let existing = match self.tracker.find_issue_by_title(&title).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(row = %row.id, error = %format!("{e:#}"), "issue lookup failed, treating as not found");
                None
            }
        };

        match existing {
            Some(issue) => {
                println!("Updating existing issue #{}", issue.number);
                self.update_issue(plan, row, issue.number, body).await;
                self.record(row, &title, RowAction::Updated, Some(issue.number), None);
                Ok(RowOutcome::Updated(issue.number))
            }
            None => {
                println!("Creating new issue");
                let request = NewIssue {
                    title: title.clone(),
                    body,
                    labels: plan
                        .label
                        .iter()
                        .cloned()
                        .chain(planned(plan.columns.has_labels(), row.label_list()))
                        .collect(),
                    assignees: planned(plan.columns.has_assignees(), row.assignee_list()),
                };
                match self.tracker.create_issue(&request).await {
                    Ok(created) => {
                        println!("Created issue {}", created.display_ref());
                        self.record(row, &title, RowAction::Created, created.number, None);
                        Ok(RowOutcome::Created(created))
                    }
                    Err(source) => {
                        let message = format!("{source:#}");
                        tracing::error!(row = %row.id, error = %message, "issue creation failed");
                        self.record(row, &title, RowAction::Failed, None, Some(&message));
                        Err(SyncError::Create {
                            id: row.id.clone(),
                            source,
                        })
                    }
                }
            }
        }
    }

    /// Best-effort edits on an existing issue; every failure is dropped.
    async fn update_issue(&self, plan: &SyncPlan, row: &BacklogRow, number: u64, body: String) {
        let mut edits = Vec::new();
        if let Some(label) = &plan.label {
            edits.push(IssueEdit::AddLabel(label.clone()));
        }
        edits.extend(
            planned(plan.columns.has_labels(), row.label_list())
                .into_iter()
                .map(IssueEdit::AddLabel),
        );
        edits.extend(
            planned(plan.columns.has_assignees(), row.assignee_list())
                .into_iter()
                .map(IssueEdit::AddAssignee),
        );
        edits.push(IssueEdit::ReplaceBody(body));

        for edit in &edits {
            if let Err(e) = self.tracker.edit_issue(number, edit).await {
                tracing::debug!(issue = number, edit = %edit.describe(), error = %format!("{e:#}"), "ignoring failed edit");
            }
        }
    }

    fn record(
        &self,
        row: &BacklogRow,
        title: &str,
        action: RowAction,
        issue_number: Option<u64>,
        message: Option<&str>,
    ) {
        let Some(journal) = &self.journal else {
            return;
        };
        let entry = new_entry(&row.id, title, action, issue_number, message);
        if let Err(e) = journal.append(&entry) {
            tracing::warn!(path = %journal.path().display(), error = %e, "could not write sync journal");
        }
    }
}

fn planned(column_present: bool, values: Vec<String>) -> Vec<String> {
    if column_present {
        values
    } else {
        Vec::new()
    }
}
