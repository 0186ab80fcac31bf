use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Longest filename the `files.filename` column accepts.
pub const MAX_FILENAME_LEN: usize = 255;
/// Longest content type the `files.mime_type` column accepts.
pub const MAX_MIME_TYPE_LEN: usize = 100;

/// A row of the `files` table. Rows are written once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredFile {
    pub id: i32,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub content: Option<Vec<u8>>,
    pub created_at: Option<NaiveDateTime>,
}

/// Everything needed to insert a file; `id` and `created_at` are assigned
/// by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl NewFile {
    pub fn new(filename: String, mime_type: String, content: Vec<u8>) -> Self {
        Self {
            filename,
            mime_type,
            content,
        }
    }

    /// Byte length of the content, as stored in `files.size`.
    pub fn size(&self) -> i64 {
        self.content.len() as i64
    }

    /// Checks the metadata against the column limits of the `files` table.
    pub fn validate(&self) -> Result<(), String> {
        if self.filename.is_empty() {
            return Err("filename is empty".to_string());
        }
        if self.filename.chars().count() > MAX_FILENAME_LEN {
            return Err(format!("filename exceeds {MAX_FILENAME_LEN} characters"));
        }
        if self.mime_type.chars().count() > MAX_MIME_TYPE_LEN {
            return Err(format!("content type exceeds {MAX_MIME_TYPE_LEN} characters"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_content_length() {
        let file = NewFile::new("a.txt".into(), "text/plain".into(), b"hello".to_vec());
        assert_eq!(file.size(), 5);

        let empty = NewFile::new("empty.bin".into(), "application/octet-stream".into(), vec![]);
        assert_eq!(empty.size(), 0);
    }

    #[test]
    fn validate_enforces_column_limits() {
        let ok = NewFile::new("a.txt".into(), "text/plain".into(), vec![]);
        assert!(ok.validate().is_ok());

        let long_name = NewFile::new("x".repeat(256), "text/plain".into(), vec![]);
        assert!(long_name.validate().is_err());

        let long_mime = NewFile::new("a.txt".into(), "t".repeat(101), vec![]);
        assert!(long_mime.validate().is_err());

        let no_name = NewFile::new(String::new(), "text/plain".into(), vec![]);
        assert!(no_name.validate().is_err());
    }
}
