pub mod backlog_row;
pub mod issue;
