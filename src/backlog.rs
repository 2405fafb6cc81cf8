//! Backlog CSV loading.
//!
//! The file is read once, front to back. Fields are split on a bare comma
//! and trimmed; quoted fields are not recognised, so a comma inside a task
//! description shifts the remaining columns.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::model::backlog_row::{BacklogRow, Columns};

pub struct BacklogReader<R = BufReader<File>> {
    path: PathBuf,
    columns: Columns,
    lines: Lines<R>,
    line_no: usize,
}

impl BacklogReader {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::MissingFile(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path, BufReader::new(file))
    }
}

impl<R: BufRead> BacklogReader<R> {
    /// Consume the header line and resolve the optional columns.
    pub fn from_reader(path: &Path, reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line.map_err(|source| SyncError::Io {
                path: path.to_path_buf(),
                source,
            })?,
            None => return Err(SyncError::EmptyBacklog(path.to_path_buf())),
        };
        let columns = Columns::from_header(header.trim_start_matches('\u{feff}'));
        tracing::debug!(
            labels = columns.has_labels(),
            assignees = columns.has_assignees(),
            "parsed backlog header"
        );
        Ok(Self {
            path: path.to_path_buf(),
            columns,
            lines,
            line_no: 1,
        })
    }

    pub fn columns(&self) -> Columns {
        self.columns
    }
}

impl<R: BufRead> Iterator for BacklogReader<R> {
    type Item = Result<BacklogRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(SyncError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let row = self.columns.row_from_fields(&fields);
            if row.id.is_empty() {
                tracing::warn!(line = self.line_no, "skipping backlog row without an id");
                continue;
            }
            return Some(Ok(row));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(contents: &str) -> BacklogReader<Cursor<&[u8]>> {
        BacklogReader::from_reader(Path::new("BACKLOG.csv"), Cursor::new(contents.as_bytes()))
            .unwrap()
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BACKLOG.csv");
        let err = BacklogReader::open(&path).err().unwrap();
        assert!(matches!(err, SyncError::MissingFile(p) if p == path));
    }

    #[test]
    fn empty_file_has_no_header() {
        let result = BacklogReader::from_reader(Path::new("BACKLOG.csv"), Cursor::new(&b""[..]));
        assert!(matches!(result, Err(SyncError::EmptyBacklog(_))));
    }

    #[test]
    fn reads_basic_row() {
        let rows: Vec<_> = reader("id,task,owner,status,issue_link\nBL-1,Fix bug,alice,open,\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.title(), "BL-1: Fix bug");
        assert_eq!(row.body("BACKLOG.md"), "Owner: alice\nStatus: open\n\nSource: BACKLOG.md");
        assert_eq!(row.labels, None);
        assert_eq!(row.assignees, None);
    }

    #[test]
    fn trims_fields_and_crlf() {
        let rows: Vec<_> = reader("id,task,owner,status,issue_link,labels\r\n BL-2 , Ship it ,bob, done ,, ui ;api\r\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows[0].id, "BL-2");
        assert_eq!(rows[0].task, "Ship it");
        assert_eq!(rows[0].status, "done");
        assert_eq!(rows[0].label_list(), vec!["ui", "api"]);
    }

    #[test]
    fn skips_blank_lines_and_rows_without_id() {
        let rows: Vec<_> = reader("id,task,owner,status,issue_link\n\nBL-1,A,a,open,\n,B,b,open,\nBL-3,C,c,open,\n")
            .collect::<Result<_>>()
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["BL-1", "BL-3"]);
    }

    #[test]
    fn embedded_comma_shifts_columns() {
        let rows: Vec<_> = reader("id,task,owner,status,issue_link\nBL-5,Fix a, b,carol,open,\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows[0].task, "Fix a");
        assert_eq!(rows[0].owner, "b");
    }

    #[test]
    fn preserves_file_order() {
        let input = "id,task,owner,status,issue_link\nBL-3,C,c,open,\nBL-1,A,a,open,\nBL-2,B,b,open,\n";
        let ids: Vec<_> = reader(input).map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["BL-3", "BL-1", "BL-2"]);
    }

    #[test]
    fn exposes_column_flags() {
        let r = reader("id,task,owner,status,issue_link,labels,assignees\n");
        assert!(r.columns().has_labels());
        assert!(r.columns().has_assignees());
    }
}
