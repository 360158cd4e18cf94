// ABOUTME: Serde data models for Drive, Docs, Sheets, and Tasks responses
// ABOUTME: Tolerant parsing with optional fields made explicit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIME_DOCUMENT: &str = "application/vnd.google-apps.document";
pub const MIME_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const MIME_PRESENTATION: &str = "application/vnd.google-apps.presentation";
pub const MIME_FOLDER: &str = "application/vnd.google-apps.folder";
pub const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, rename = "type")]
    pub perm_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub can_edit: Option<bool>,
    #[serde(default)]
    pub can_comment: Option<bool>,
    #[serde(default)]
    pub can_share: Option<bool>,
    #[serde(default)]
    pub can_download: Option<bool>,
    #[serde(default)]
    pub can_copy: Option<bool>,
    #[serde(default)]
    pub can_delete: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Drive reports sizes as a stringified int64.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub owners: Vec<User>,
    #[serde(default)]
    pub last_modifying_user: Option<User>,
    #[serde(default)]
    pub shared: Option<bool>,
    #[serde(default)]
    pub starred: Option<bool>,
    #[serde(default)]
    pub trashed: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
}

impl FileMetadata {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled")
    }

    pub fn mime(&self) -> &str {
        self.mime_type.as_deref().unwrap_or("")
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn is_document(&self) -> bool {
        self.mime() == MIME_DOCUMENT
    }

    pub fn is_spreadsheet(&self) -> bool {
        self.mime() == MIME_SPREADSHEET
    }

    pub fn is_google_native(&self) -> bool {
        self.mime().starts_with(GOOGLE_APPS_PREFIX)
    }

    /// "Document" for application/vnd.google-apps.document, "PDF" for
    /// application/pdf, the raw MIME type otherwise.
    pub fn type_display(&self) -> String {
        let mime = self.mime();
        if let Some(kind) = mime.strip_prefix(GOOGLE_APPS_PREFIX) {
            let mut chars = kind.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => mime.to_string(),
            }
        } else if let Some((_, subtype)) = mime.split_once('/') {
            subtype.to_uppercase()
        } else {
            mime.to_string()
        }
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;

    #[test]
    fn test_file_metadata_deserialize_minimal() {
        let json = r#"{"id": "f1"}"#;
        let file: FileMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "f1");
        assert_eq!(file.display_name(), "Untitled");
        assert!(file.size_bytes().is_none());
        assert!(!file.is_google_native());
    }

    #[test]
    fn test_file_metadata_deserialize_full() {
        let json = r#"{
            "id": "f1",
            "name": "Notes",
            "mimeType": "application/vnd.google-apps.document",
            "size": "2048",
            "createdTime": "2025-10-28T15:04:05Z",
            "modifiedTime": "2025-10-29T01:23:45Z",
            "webViewLink": "https://docs.google.com/document/d/f1/edit",
            "owners": [{"displayName": "Alice", "emailAddress": "alice@example.com"}],
            "shared": true,
            "unknownField": "ignored"
        }"#;
        let file: FileMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(file.display_name(), "Notes");
        assert_eq!(file.size_bytes(), Some(2048));
        assert!(file.is_document());
        assert!(file.is_google_native());
        assert_eq!(file.owners[0].display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_type_display() {
        let mut file: FileMetadata = serde_json::from_str(r#"{"id": "f1"}"#).unwrap();

        file.mime_type = Some(MIME_SPREADSHEET.into());
        assert_eq!(file.type_display(), "Spreadsheet");

        file.mime_type = Some("application/pdf".into());
        assert_eq!(file.type_display(), "PDF");

        file.mime_type = Some("text/plain".into());
        assert_eq!(file.type_display(), "PLAIN");
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub quoted_file_content: Option<QuotedFileContent>,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedFileContent {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub self_link: Option<String>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod task_tests {
    use super::*;

    #[test]
    fn test_task_deserialize() {
        let json = r#"{
            "id": "t1",
            "title": "Ship release",
            "status": "needsAction",
            "due": "2025-11-01T00:00:00.000Z",
            "notes": "check the changelog"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.title.as_deref(), Some("Ship release"));
        assert!(!task.is_completed());
        assert!(task.due.is_some());
    }

    #[test]
    fn test_task_completed_status() {
        let json = r#"{"id": "t2", "status": "completed", "completed": "2025-10-30T12:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.is_completed());
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub properties: Option<SpreadsheetProperties>,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Spreadsheet {
    pub fn title(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|p| p.title.as_deref())
            .unwrap_or("spreadsheet")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetProperties {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(default)]
    pub properties: Option<SheetProperties>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub index: Option<i64>,
}

// --- Docs document tree ---------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub revision_id: Option<String>,
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub tab_properties: Option<TabProperties>,
    // Some responses carry tab identity at the tab level instead.
    #[serde(default)]
    pub tab_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub document_tab: Option<DocumentTab>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabProperties {
    #[serde(default)]
    pub tab_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTab {
    #[serde(default)]
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// One node of the document content tree: paragraph, table, or anything
/// else (section breaks, tables of contents) which contributes no text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StructuralElement {
    Paragraph { paragraph: Paragraph },
    Table { table: Table },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    #[serde(default)]
    pub paragraph_style: Option<ParagraphStyle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    #[serde(default)]
    pub named_style_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParagraphElement {
    #[serde(rename_all = "camelCase")]
    TextRun { text_run: TextRun },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}
