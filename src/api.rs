// ABOUTME: Blocking HTTP client for the Drive, Docs, Sheets, and Tasks APIs
// ABOUTME: Bearer auth, status checks, and typed JSON responses

use crate::model::{Comment, Document, FileMetadata, Spreadsheet, Task, TaskList};
use crate::{Error, Result};
use reqwest::blocking::{Client, Response};
use std::time::Duration;

const DRIVE_BASE: &str = "https://www.googleapis.com/drive/v3";
const DOCS_BASE: &str = "https://docs.googleapis.com/v1";
const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4";
const TASKS_BASE: &str = "https://tasks.googleapis.com/tasks/v1";
const EXPORT_BASE: &str = "https://docs.google.com";

const BASIC_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime,webViewLink";
const DETAILED_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime,webViewLink,\
                               owners,lastModifyingUser,permissions,shared,description,starred,\
                               trashed,parents,version,capabilities";
const LIST_FIELDS: &str = "files(id,name,mimeType,size,createdTime,modifiedTime,webViewLink,owners)";
const COMMENT_FIELDS: &str = "comments(id,content,author,createdTime,modifiedTime,resolved,\
                              deleted,replies,quotedFileContent,anchor)";

pub(crate) fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

/// Filters for the file listing endpoint.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub query: Option<String>,
    pub mime_type: Option<String>,
    pub max_results: u32,
    pub order_by: String,
    pub include_trashed: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            query: None,
            mime_type: None,
            max_results: 20,
            order_by: "modifiedTime desc".to_string(),
            include_trashed: false,
        }
    }
}

impl ListQuery {
    /// Drive query-language conjunction, or None when unfiltered.
    fn filter_expression(&self) -> Option<String> {
        let mut parts = Vec::new();

        if !self.include_trashed {
            parts.push("trashed = false".to_string());
        }
        if let Some(q) = &self.query {
            let q = q.replace('\'', "\\'");
            parts.push(format!("(name contains '{q}' or fullText contains '{q}')"));
        }
        if let Some(mime) = &self.mime_type {
            parts.push(format!("mimeType = '{mime}'"));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" and "))
        }
    }
}

pub struct ApiClient {
    http: Client,
    token: String,
    drive_base: String,
    docs_base: String,
    sheets_base: String,
    tasks_base: String,
    export_base: String,
}

impl ApiClient {
    pub fn new(token: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("drivectl/0.4 (Rust)")
            .build()?;

        Ok(ApiClient {
            http,
            token,
            drive_base: DRIVE_BASE.into(),
            docs_base: DOCS_BASE.into(),
            sheets_base: SHEETS_BASE.into(),
            tasks_base: TASKS_BASE.into(),
            export_base: EXPORT_BASE.into(),
        })
    }

    /// Point every service at a single base URL (for test servers).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.drive_base = base.clone();
        self.docs_base = base.clone();
        self.sheets_base = base.clone();
        self.tasks_base = base.clone();
        self.export_base = base;
        self
    }

    fn get_checked(&self, endpoint: &str, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_str(&message, 100),
            });
        }

        Ok(response)
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get_checked(endpoint, url, query)?.text()?;
        serde_json::from_str(&body).map_err(|e| {
            eprintln!("Failed to parse response from {}: {}", endpoint, e);
            eprintln!("Response body (first 500 chars): {}", truncate_str(&body, 500));
            Error::Parse(e)
        })
    }

    /// Raw authorized GET that reports the status instead of failing on it.
    /// The spreadsheet CSV exporter drives its retry loop off this.
    pub fn http_get(&self, url: &str) -> Result<(u16, Vec<u8>)> {
        let response = self.http.get(url).bearer_auth(&self.token).send()?;
        let status = response.status().as_u16();
        let bytes = response.bytes()?.to_vec();
        Ok((status, bytes))
    }

    // --- Drive -------------------------------------------------------------

    pub fn get_file_metadata(&self, file_id: &str, detailed: bool) -> Result<FileMetadata> {
        let fields = if detailed { DETAILED_FIELDS } else { BASIC_FIELDS };
        self.get_json(
            "file metadata",
            &format!("{}/files/{}", self.drive_base, file_id),
            &[
                ("fields", fields.to_string()),
                ("supportsAllDrives", "true".to_string()),
            ],
        )
    }

    pub fn list_files(&self, query: &ListQuery) -> Result<Vec<FileMetadata>> {
        #[derive(serde::Deserialize)]
        struct FileListResponse {
            #[serde(default)]
            files: Vec<FileMetadata>,
        }

        let mut params = vec![
            ("pageSize", query.max_results.to_string()),
            ("orderBy", query.order_by.clone()),
            ("fields", LIST_FIELDS.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(filter) = query.filter_expression() {
            params.push(("q", filter));
        }

        let resp: FileListResponse =
            self.get_json("file list", &format!("{}/files", self.drive_base), &params)?;
        Ok(resp.files)
    }

    /// Export a Google-native file through the conversion endpoint. Returns
    /// the open response so callers can stream the body.
    pub fn export_file(&self, file_id: &str, mime_type: &str) -> Result<Response> {
        self.get_checked(
            "file export",
            &format!("{}/files/{}/export", self.drive_base, file_id),
            &[("mimeType", mime_type.to_string())],
        )
    }

    /// Download an ordinary file's bytes. Returns the open response so
    /// callers can stream the body with progress reporting.
    pub fn download_media(&self, file_id: &str) -> Result<Response> {
        self.get_checked(
            "file download",
            &format!("{}/files/{}", self.drive_base, file_id),
            &[
                ("alt", "media".to_string()),
                ("supportsAllDrives", "true".to_string()),
            ],
        )
    }

    pub fn list_comments(&self, file_id: &str) -> Result<Vec<Comment>> {
        #[derive(serde::Deserialize)]
        struct CommentsResponse {
            #[serde(default)]
            comments: Vec<Comment>,
        }

        let resp: CommentsResponse = self.get_json(
            "comment list",
            &format!("{}/files/{}/comments", self.drive_base, file_id),
            &[
                ("fields", COMMENT_FIELDS.to_string()),
                ("includeDeleted", "false".to_string()),
            ],
        )?;
        Ok(resp.comments)
    }

    // --- Docs --------------------------------------------------------------

    pub fn get_document(&self, document_id: &str, include_tabs: bool) -> Result<Document> {
        self.get_json(
            "document",
            &format!("{}/documents/{}", self.docs_base, document_id),
            &[("includeTabsContent", include_tabs.to_string())],
        )
    }

    // --- Sheets ------------------------------------------------------------

    pub fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        self.get_json(
            "spreadsheet metadata",
            &format!("{}/spreadsheets/{}", self.sheets_base, spreadsheet_id),
            &[(
                "fields",
                "spreadsheetId,properties.title,sheets.properties".to_string(),
            )],
        )
    }

    /// Direct CSV export URL for one sheet. This deliberately bypasses the
    /// conversion API, which cannot export a single sheet; the URL shape is
    /// undocumented and may break without notice.
    pub fn sheet_export_url(&self, spreadsheet_id: &str, sheet_id: i64) -> String {
        format!(
            "{}/spreadsheets/d/{}/export?format=csv&gid={}",
            self.export_base, spreadsheet_id, sheet_id
        )
    }

    // --- Tasks -------------------------------------------------------------

    pub fn list_tasks(
        &self,
        tasklist_id: &str,
        max_results: u32,
        show_completed: bool,
    ) -> Result<Vec<Task>> {
        #[derive(serde::Deserialize)]
        struct TasksResponse {
            #[serde(default)]
            items: Vec<Task>,
        }

        let resp: TasksResponse = self.get_json(
            "task list",
            &format!("{}/lists/{}/tasks", self.tasks_base, tasklist_id),
            &[
                ("maxResults", max_results.to_string()),
                ("showCompleted", show_completed.to_string()),
            ],
        )?;
        Ok(resp.items)
    }

    pub fn list_task_lists(&self, max_results: u32) -> Result<Vec<TaskList>> {
        #[derive(serde::Deserialize)]
        struct TaskListsResponse {
            #[serde(default)]
            items: Vec<TaskList>,
        }

        let resp: TaskListsResponse = self.get_json(
            "task lists",
            &format!("{}/users/@me/lists", self.tasks_base),
            &[("maxResults", max_results.to_string())],
        )?;
        Ok(resp.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_short() {
        assert_eq!(truncate_str("hello", 100), "hello");
    }

    #[test]
    fn test_truncate_str_long() {
        let result = truncate_str("hello world", 7);
        assert!(result.starts_with("hello"));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_str_utf8_boundary() {
        // Must not panic splitting inside a multi-byte character
        let result = truncate_str("Hello 世界 World", 10);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_api_client_defaults() {
        let client = ApiClient::new("test_token".into()).unwrap();
        assert_eq!(client.drive_base, DRIVE_BASE);
        assert_eq!(client.export_base, EXPORT_BASE);
        assert_eq!(client.token, "test_token");
    }

    #[test]
    fn test_api_client_base_override() {
        let client = ApiClient::new("token".into())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(client.drive_base, "http://127.0.0.1:9");
        assert_eq!(client.tasks_base, "http://127.0.0.1:9");
    }

    #[test]
    fn test_sheet_export_url() {
        let client = ApiClient::new("token".into()).unwrap();
        assert_eq!(
            client.sheet_export_url("sheet123", 42),
            "https://docs.google.com/spreadsheets/d/sheet123/export?format=csv&gid=42"
        );
    }

    #[test]
    fn test_list_query_default_filters_trash() {
        let query = ListQuery::default();
        assert_eq!(query.filter_expression().as_deref(), Some("trashed = false"));
    }

    #[test]
    fn test_list_query_full_expression() {
        let query = ListQuery {
            query: Some("budget".into()),
            mime_type: Some("application/vnd.google-apps.spreadsheet".into()),
            ..ListQuery::default()
        };
        assert_eq!(
            query.filter_expression().as_deref(),
            Some(
                "trashed = false and (name contains 'budget' or fullText contains 'budget') \
                 and mimeType = 'application/vnd.google-apps.spreadsheet'"
            )
        );
    }

    #[test]
    fn test_list_query_escapes_quotes() {
        let query = ListQuery {
            query: Some("o'brien".into()),
            ..ListQuery::default()
        };
        let expr = query.filter_expression().unwrap();
        assert!(expr.contains(r"o\'brien"));
    }

    #[test]
    fn test_list_query_with_trash_and_no_filters() {
        let query = ListQuery {
            include_trashed: true,
            ..ListQuery::default()
        };
        assert!(query.filter_expression().is_none());
    }
}
