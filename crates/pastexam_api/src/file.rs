use serde::{Deserialize, Serialize};

/// Загруженный файл экзамена (`FileResponse` на бэкенде).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_id: i64,
    pub filename: String,
    pub file_location: String,
    pub uploader_id: i64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BookmarkStatus {
    pub is_bookmarked: bool,
}
