use std::fmt;

use crate::services::file::FileId;

/// Body of a successful `POST /add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileUploadResponse {
    pub id: FileId,
}

impl fmt::Display for FileUploadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File uploaded successfully with ID: {}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_decimal_id() {
        let body = FileUploadResponse { id: 42 }.to_string();
        assert_eq!(body, "File uploaded successfully with ID: 42");
    }
}
