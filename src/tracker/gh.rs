use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{exact_match, TrackerClient};
use crate::model::issue::{CreatedIssue, IssueEdit, IssueRef, LabelSpec, NewIssue};

/// Talks to GitHub through the `gh` CLI, which owns authentication.
pub struct GhTracker {
    bin: String,
    repo: Option<String>,
}

impl GhTracker {
    pub fn new(bin: String, repo: Option<String>) -> Self {
        Self { bin, repo }
    }

    async fn run_gh(&self, mut args: Vec<String>) -> Result<String> {
        if let Some(repo) = &self.repo {
            args.push("--repo".into());
            args.push(repo.clone());
        }
        tracing::debug!(bin = %self.bin, args = ?args, "running gh");

        let output = tokio::process::Command::new(&self.bin)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.bin))?;

        let subcommand = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("gh {subcommand} failed: {}", stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn label_list_args(name: &str) -> Vec<String> {
    strings(&["label", "list", "--search", name, "--json", "name", "--limit", "100"])
}

fn label_create_args(label: &LabelSpec) -> Vec<String> {
    strings(&[
        "label",
        "create",
        &label.name,
        "--color",
        &label.color,
        "--description",
        &label.description,
    ])
}

fn search_args(title: &str) -> Vec<String> {
    strings(&[
        "issue",
        "list",
        "--state",
        "all",
        "--search",
        &format!("{title} in:title"),
        "--limit",
        "1",
        "--json",
        "number,title",
    ])
}

fn create_args(issue: &NewIssue) -> Vec<String> {
    let mut args = strings(&["issue", "create", "--title", &issue.title, "--body", &issue.body]);
    for label in &issue.labels {
        args.push("--label".into());
        args.push(label.clone());
    }
    for assignee in &issue.assignees {
        args.push("--assignee".into());
        args.push(assignee.clone());
    }
    args
}

fn edit_args(number: u64, edit: &IssueEdit) -> Vec<String> {
    let (flag, value) = match edit {
        IssueEdit::AddLabel(name) => ("--add-label", name),
        IssueEdit::AddAssignee(login) => ("--add-assignee", login),
        IssueEdit::ReplaceBody(body) => ("--body", body),
    };
    strings(&["issue", "edit", &number.to_string(), flag, value])
}

/// `gh issue list --json` prints `[]` when nothing matches; an empty or
/// `null` reply is treated the same way.
fn parse_search(stdout: &str) -> Result<Option<IssueRef>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let issues: Vec<IssueRef> =
        serde_json::from_str(trimmed).context("Failed to parse gh issue list output")?;
    Ok(issues.into_iter().next())
}

/// `gh issue create` prints the new issue's URL, e.g.
/// `https://github.com/owner/repo/issues/42`.
fn parse_created(stdout: &str) -> CreatedIssue {
    let url = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(String::from);
    let number = url
        .as_deref()
        .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
        .and_then(|n| n.parse().ok());
    CreatedIssue { number, url }
}

#[async_trait]
impl TrackerClient for GhTracker {
    fn name(&self) -> &str {
        "gh"
    }

    async fn label_exists(&self, name: &str) -> Result<bool> {
        let stdout = self.run_gh(label_list_args(name)).await?;
        let labels: Vec<GhLabel> =
            serde_json::from_str(stdout.trim()).context("Failed to parse gh label list output")?;
        Ok(labels.iter().any(|l| l.name.eq_ignore_ascii_case(name)))
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<()> {
        self.run_gh(label_create_args(label)).await?;
        Ok(())
    }

    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>> {
        let stdout = self.run_gh(search_args(title)).await?;
        Ok(exact_match(parse_search(&stdout)?, title))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let stdout = self.run_gh(create_args(issue)).await?;
        Ok(parse_created(&stdout))
    }

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<()> {
        self.run_gh(edit_args(number, edit)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_args_repeat_label_and_assignee_flags() {
        let issue = NewIssue {
            title: "BL-1: Fix bug".into(),
            body: "Owner: alice".into(),
            labels: vec!["backlog".into(), "bug".into()],
            assignees: vec!["alice".into()],
        };
        assert_eq!(
            create_args(&issue),
            vec![
                "issue", "create", "--title", "BL-1: Fix bug", "--body", "Owner: alice", "--label",
                "backlog", "--label", "bug", "--assignee", "alice",
            ]
        );
    }

    #[test]
    fn edit_args_per_kind() {
        assert_eq!(
            edit_args(7, &IssueEdit::AddLabel("ui".into())),
            vec!["issue", "edit", "7", "--add-label", "ui"]
        );
        assert_eq!(
            edit_args(7, &IssueEdit::AddAssignee("bob".into())),
            vec!["issue", "edit", "7", "--add-assignee", "bob"]
        );
        assert_eq!(
            edit_args(7, &IssueEdit::ReplaceBody("new".into())),
            vec!["issue", "edit", "7", "--body", "new"]
        );
    }

    #[test]
    fn search_is_limited_to_one_result() {
        let args = search_args("BL-1: Fix bug");
        assert!(args.windows(2).any(|w| w == ["--limit", "1"]));
        assert!(args.contains(&"BL-1: Fix bug in:title".to_string()));
    }

    #[test]
    fn parse_search_handles_empty_and_null() {
        assert_eq!(parse_search("").unwrap(), None);
        assert_eq!(parse_search("null\n").unwrap(), None);
        assert_eq!(parse_search("[]").unwrap(), None);
    }

    #[test]
    fn parse_search_takes_first_hit() {
        let hit = parse_search(r#"[{"number":12,"title":"BL-1: Fix bug"}]"#).unwrap();
        assert_eq!(
            hit,
            Some(IssueRef {
                number: 12,
                title: "BL-1: Fix bug".into()
            })
        );
    }

    #[test]
    fn fuzzy_hit_is_not_a_match() {
        let hit = parse_search(r#"[{"number":12,"title":"BL-10: Fix bug"}]"#).unwrap();
        assert_eq!(exact_match(hit, "BL-1: Fix bug"), None);
    }

    #[test]
    fn parse_created_reads_number_from_url() {
        let created = parse_created("https://github.com/acme/widgets/issues/42\n");
        assert_eq!(created.number, Some(42));
        assert_eq!(
            created.url.as_deref(),
            Some("https://github.com/acme/widgets/issues/42")
        );
    }

    #[test]
    fn parse_created_tolerates_unexpected_output() {
        let created = parse_created("Creating issue in acme/widgets\n\nsomething else\n");
        assert_eq!(created.number, None);
        assert_eq!(created.url.as_deref(), Some("something else"));
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let tracker = GhTracker::new("/nonexistent/gh-binary".into(), None);
        assert!(tracker.find_issue_by_title("BL-1: x").await.is_err());
    }
}
