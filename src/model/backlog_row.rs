use crate::util::split::split_list;

/// One data line of the backlog CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogRow {
    pub id: String,
    pub task: String,
    pub owner: String,
    pub status: String,
    /// Carried through but never used for matching or updates.
    pub issue_link: String,
    /// `None` when the header has no `labels` column.
    pub labels: Option<String>,
    /// `None` when the header has no `assignees` column.
    pub assignees: Option<String>,
}

impl BacklogRow {
    /// The issue title, also the key used to find an existing issue.
    pub fn title(&self) -> String {
        format!("{}: {}", self.id, self.task)
    }

    pub fn body(&self, source_note: &str) -> String {
        format!(
            "Owner: {}\nStatus: {}\n\nSource: {}",
            self.owner, self.status, source_note
        )
    }

    pub fn label_list(&self) -> Vec<String> {
        self.labels.as_deref().map(split_list).unwrap_or_default()
    }

    pub fn assignee_list(&self) -> Vec<String> {
        self.assignees.as_deref().map(split_list).unwrap_or_default()
    }
}

/// Positions of the optional columns, resolved once from the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Columns {
    pub labels: Option<usize>,
    pub assignees: Option<usize>,
}

impl Columns {
    pub fn from_header(header: &str) -> Self {
        let mut columns = Columns::default();
        for (idx, name) in header.split(',').map(str::trim).enumerate() {
            if name.eq_ignore_ascii_case("labels") {
                columns.labels.get_or_insert(idx);
            } else if name.eq_ignore_ascii_case("assignees") {
                columns.assignees.get_or_insert(idx);
            }
        }
        columns
    }

    pub fn has_labels(&self) -> bool {
        self.labels.is_some()
    }

    pub fn has_assignees(&self) -> bool {
        self.assignees.is_some()
    }

    /// Build a row from an already split and trimmed line. The first five
    /// fields are positional; missing trailing fields read as empty.
    pub fn row_from_fields(&self, fields: &[&str]) -> BacklogRow {
        let field = |idx: usize| fields.get(idx).copied().unwrap_or_default().to_string();
        BacklogRow {
            id: field(0),
            task: field(1),
            owner: field(2),
            status: field(3),
            issue_link: field(4),
            labels: self.labels.map(&field),
            assignees: self.assignees.map(&field),
        }
    }
}
