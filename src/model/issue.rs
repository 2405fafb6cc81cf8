use serde::{Deserialize, Serialize};

/// An existing tracker issue found by title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
}

/// Everything needed to open a new issue in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
}

/// A single best-effort change applied to an existing issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueEdit {
    AddLabel(String),
    AddAssignee(String),
    ReplaceBody(String),
}

impl IssueEdit {
    pub fn describe(&self) -> String {
        match self {
            IssueEdit::AddLabel(name) => format!("add label '{name}'"),
            IssueEdit::AddAssignee(login) => format!("add assignee '{login}'"),
            IssueEdit::ReplaceBody(_) => "replace body".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedIssue {
    /// Missing when the tracker's reply did not carry a parseable number.
    pub number: Option<u64>,
    pub url: Option<String>,
}

impl CreatedIssue {
    pub fn display_ref(&self) -> String {
        match (self.number, &self.url) {
            (Some(number), _) => format!("#{number}"),
            (None, Some(url)) => url.clone(),
            (None, None) => "(unknown)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSpec {
    pub name: String,
    /// Hex color without the leading `#`.
    pub color: String,
    pub description: String,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            name: "backlog".into(),
            color: "c5def5".into(),
            description: "Tracked in BACKLOG.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStatus {
    Existed,
    Created,
    /// Missing, and a dry run only reported that it would be created.
    Planned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_issue_omits_empty_lists() {
        let issue = NewIssue {
            title: "BL-1: Fix bug".into(),
            body: "Owner: alice".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(!json.contains("labels"));
        assert!(!json.contains("assignees"));
    }

    #[test]
    fn created_issue_prefers_number() {
        let created = CreatedIssue {
            number: Some(42),
            url: Some("https://github.com/o/r/issues/42".into()),
        };
        assert_eq!(created.display_ref(), "#42");

        let url_only = CreatedIssue {
            number: None,
            url: Some("https://example.com/x".into()),
        };
        assert_eq!(url_only.display_ref(), "https://example.com/x");
    }

    #[test]
    fn default_label_is_backlog() {
        let label = LabelSpec::default();
        assert_eq!(label.name, "backlog");
        assert!(!label.color.starts_with('#'));
    }
}
