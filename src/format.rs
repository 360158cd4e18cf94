// ABOUTME: Text rendering for listings, tasks, comments, and file info
// ABOUTME: Pure string builders so command output is testable

use crate::api::truncate_str;
use crate::docs::{DocTab, Heading};
use crate::model::{Capabilities, Comment, FileMetadata, Permission, Task, TaskList};
use crate::sheets::SheetInfo;
use crate::util::format_file_size;
use chrono::{DateTime, Utc};

const SEPARATOR_WIDTH: usize = 70;

pub fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// A `===` framed section heading.
pub fn section(title: &str) -> String {
    let sep = separator();
    format!("{sep}\n{title}\n{sep}")
}

fn short_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

fn full_time(time: Option<&DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "unknown".into())
}

pub fn format_file_list(files: &[FileMetadata], verbose: bool) -> String {
    if files.is_empty() {
        return "No files found.".to_string();
    }

    let mut output = Vec::new();
    for file in files {
        let type_display = file.type_display();
        if verbose {
            let size_display = file
                .size_bytes()
                .map(|s| format!(" ({})", format_file_size(Some(s))))
                .unwrap_or_default();
            let owner = file
                .owners
                .first()
                .and_then(|o| o.display_name.as_deref())
                .unwrap_or("");
            output.push(format!(
                "[{}] {}\n  ID: {}\n  Modified: {}{}\n  Owner: {}\n",
                type_display,
                file.display_name(),
                file.id,
                full_time(file.modified_time.as_ref()),
                size_display,
                owner
            ));
        } else {
            output.push(format!(
                "[{:<12}] {:<44} {}",
                type_display,
                file.id,
                file.display_name()
            ));
        }
    }

    output.join("\n")
}

pub fn format_tabs(tabs: &[DocTab]) -> String {
    if tabs.is_empty() {
        return "No tabs found.".to_string();
    }

    tabs.iter()
        .map(|tab| format!("  {} (ID: {})", tab.title, tab.id))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_headings(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return "No headings found.".to_string();
    }

    headings
        .iter()
        .map(|heading| {
            let depth = heading.level.parse::<usize>().unwrap_or(1);
            format!("{}- {}", "  ".repeat(depth), heading.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_sheets(sheets: &[SheetInfo]) -> String {
    if sheets.is_empty() {
        return "No sheets found.".to_string();
    }

    sheets
        .iter()
        .map(|sheet| format!("  {} (ID: {})", sheet.title, sheet.id))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_tasks(tasks: &[Task], verbose: bool) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("\n{}", section(&format!("TASKS ({} total)", tasks.len()))));
    lines.push(String::new());

    for task in tasks {
        let indicator = if task.is_completed() { "✓" } else { "○" };
        let title = task.title.as_deref().unwrap_or("(No title)");
        lines.push(format!("{indicator} {title}"));

        if verbose {
            lines.push(format!("  ID: {}", task.id.as_deref().unwrap_or("N/A")));
            if let Some(due) = &task.due {
                lines.push(format!("  Due: {}", short_time(due)));
            }
            if let Some(notes) = &task.notes {
                lines.push(format!("  Notes: {}", truncate_str(notes, 100)));
            }
            if task.is_completed() {
                if let Some(completed) = &task.completed {
                    lines.push(format!("  Completed: {}", short_time(completed)));
                }
            }
            if let Some(updated) = &task.updated {
                lines.push(format!("  Updated: {}", short_time(updated)));
            }
            if let Some(link) = &task.self_link {
                lines.push(format!("  Link: {link}"));
            }
            lines.push(String::new());
        }
    }

    lines.push(format!("{}\n", separator()));
    lines.join("\n")
}

pub fn format_task_lists(task_lists: &[TaskList]) -> String {
    if task_lists.is_empty() {
        return "No task lists found.".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!(
        "\n{}",
        section(&format!("TASK LISTS ({} total)", task_lists.len()))
    ));
    lines.push(String::new());

    for task_list in task_lists {
        lines.push(task_list.title.clone().unwrap_or_else(|| "(No title)".into()));
        lines.push(format!("   ID: {}", task_list.id.as_deref().unwrap_or("N/A")));
        if let Some(updated) = &task_list.updated {
            lines.push(format!("   Updated: {}", short_time(updated)));
        }
        lines.push(String::new());
    }

    lines.push(format!("{}\n", separator()));
    lines.join("\n")
}

pub fn format_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "No comments found.".to_string();
    }

    let mut output = Vec::new();

    for comment in comments {
        let author = comment
            .author
            .as_ref()
            .and_then(|a| a.display_name.as_deref())
            .unwrap_or("Unknown");

        let status = if comment.deleted {
            " [DELETED]"
        } else if comment.resolved {
            " [RESOLVED]"
        } else {
            ""
        };

        output.push(format!("\n{}", separator()));
        output.push(format!("{author}{status}"));
        output.push(separator());
        output.push(format!("Created: {}", full_time(comment.created_time.as_ref())));

        if let Some(quoted) = comment
            .quoted_file_content
            .as_ref()
            .and_then(|q| q.value.as_deref())
        {
            output.push("\nQuoted text:".to_string());
            output.push(format!("  \"{quoted}\""));
        }

        output.push(format!(
            "\n{}",
            comment.content.as_deref().unwrap_or("").trim()
        ));

        if !comment.replies.is_empty() {
            output.push(format!("\n  Replies ({}):", comment.replies.len()));
            for reply in &comment.replies {
                let reply_author = reply
                    .author
                    .as_ref()
                    .and_then(|a| a.display_name.as_deref())
                    .unwrap_or("Unknown");
                output.push(format!(
                    "\n  -> {} ({}):",
                    reply_author,
                    full_time(reply.created_time.as_ref())
                ));
                output.push(format!("    {}", reply.content.as_deref().unwrap_or("").trim()));
            }
        }
    }

    output.push(format!("\n{}\n", separator()));
    output.push(format!("Total comments: {}", comments.len()));

    output.join("\n")
}

pub fn format_info_basic(metadata: &FileMetadata) -> String {
    let mut lines = Vec::new();
    lines.push(format!("\n{}\n", section("FILE INFORMATION")));

    lines.push(format!("Name: {}", metadata.display_name()));
    lines.push(format!("ID: {}", metadata.id));
    lines.push(format!("Type: {}", metadata.mime()));
    if let Some(size) = metadata.size_bytes() {
        lines.push(format!("Size: {}", format_file_size(Some(size))));
    }

    lines.push(String::new());
    lines.push(format!(
        "Created: {}",
        full_time(metadata.created_time.as_ref())
    ));
    lines.push(format!(
        "Modified: {}",
        full_time(metadata.modified_time.as_ref())
    ));

    if let Some(link) = &metadata.web_view_link {
        lines.push(String::new());
        lines.push(format!("Web Link: {link}"));
    }

    lines.join("\n")
}

pub fn format_info_detailed(metadata: &FileMetadata) -> String {
    let mut lines = Vec::new();
    lines.push(format!("\n{}\n", section("DETAILED INFORMATION")));

    if !metadata.owners.is_empty() {
        lines.push("Owner(s):".to_string());
        for owner in &metadata.owners {
            lines.push(format!(
                "  - {} ({})",
                owner.display_name.as_deref().unwrap_or("Unknown"),
                owner.email_address.as_deref().unwrap_or("N/A")
            ));
        }
    }

    if let Some(modifier) = &metadata.last_modifying_user {
        lines.push(format!(
            "\nLast Modified By: {} ({})",
            modifier.display_name.as_deref().unwrap_or("Unknown"),
            modifier.email_address.as_deref().unwrap_or("N/A")
        ));
    }

    lines.push(format!("\nShared: {}", metadata.shared.unwrap_or(false)));
    if metadata.starred.unwrap_or(false) {
        lines.push("Starred: Yes".to_string());
    }
    if let Some(description) = &metadata.description {
        lines.push(format!("\nDescription: {description}"));
    }
    if let Some(version) = &metadata.version {
        lines.push(format!("\nVersion: {version}"));
    }

    if !metadata.permissions.is_empty() {
        lines.push(format!(
            "\n{}\n",
            section(&format!("PERMISSIONS ({} total)", metadata.permissions.len()))
        ));
        for permission in &metadata.permissions {
            lines.push(format_permission(permission));
        }
    }

    if let Some(capabilities) = &metadata.capabilities {
        lines.push(format!("\n{}\n", section("CAPABILITIES")));
        lines.push(format_capabilities(capabilities));
    }

    lines.join("\n")
}

fn format_permission(permission: &Permission) -> String {
    let role = permission.role.as_deref().unwrap_or("unknown");
    match permission.perm_type.as_deref().unwrap_or("unknown") {
        "user" => {
            let email = permission.email_address.as_deref().unwrap_or("N/A");
            let name = permission.display_name.as_deref().unwrap_or(email);
            format!("  {name} ({email}): {role}")
        }
        "group" => format!(
            "  Group ({}): {role}",
            permission.email_address.as_deref().unwrap_or("N/A")
        ),
        "domain" => format!(
            "  Domain ({}): {role}",
            permission.domain.as_deref().unwrap_or("N/A")
        ),
        "anyone" => format!("  Anyone with link: {role}"),
        other => format!("  {other}: {role}"),
    }
}

fn format_capabilities(capabilities: &Capabilities) -> String {
    let entries = [
        ("Edit", capabilities.can_edit),
        ("Comment", capabilities.can_comment),
        ("Share", capabilities.can_share),
        ("Download", capabilities.can_download),
        ("Copy", capabilities.can_copy),
        ("Delete", capabilities.can_delete),
    ];

    entries
        .iter()
        .filter_map(|(name, value)| {
            value.map(|allowed| {
                let status = if allowed { "✓ Yes" } else { "✗ No" };
                format!("  {name}: {status}")
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(value: serde_json::Value) -> FileMetadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_file_list_empty() {
        assert_eq!(format_file_list(&[], false), "No files found.");
    }

    #[test]
    fn test_format_file_list_compact() {
        let files = vec![file(json!({
            "id": "abc123",
            "name": "Notes",
            "mimeType": "application/vnd.google-apps.document"
        }))];
        let output = format_file_list(&files, false);
        assert!(output.contains("[Document"));
        assert!(output.contains("abc123"));
        assert!(output.contains("Notes"));
    }

    #[test]
    fn test_format_file_list_verbose_has_owner() {
        let files = vec![file(json!({
            "id": "abc123",
            "name": "Notes",
            "mimeType": "application/pdf",
            "size": "2048",
            "modifiedTime": "2025-10-29T01:23:45Z",
            "owners": [{"displayName": "Alice"}]
        }))];
        let output = format_file_list(&files, true);
        assert!(output.contains("ID: abc123"));
        assert!(output.contains("Owner: Alice"));
        assert!(output.contains("2.0 KB"));
    }

    #[test]
    fn test_format_tasks_indicators() {
        let tasks: Vec<Task> = vec![
            serde_json::from_value(json!({"title": "Open item", "status": "needsAction"})).unwrap(),
            serde_json::from_value(json!({"title": "Done item", "status": "completed"})).unwrap(),
        ];
        let output = format_tasks(&tasks, false);
        assert!(output.contains("○ Open item"));
        assert!(output.contains("✓ Done item"));
        assert!(output.contains("TASKS (2 total)"));
    }

    #[test]
    fn test_format_tasks_verbose_truncates_notes() {
        let long_notes = "n".repeat(150);
        let tasks: Vec<Task> = vec![serde_json::from_value(json!({
            "id": "t1",
            "title": "Big notes",
            "notes": long_notes,
            "due": "2025-11-01T00:00:00Z"
        }))
        .unwrap()];
        let output = format_tasks(&tasks, true);
        assert!(output.contains("Due: 2025-11-01 00:00"));
        assert!(output.contains("..."));
        assert!(!output.contains(&"n".repeat(150)));
    }

    #[test]
    fn test_format_task_lists() {
        let lists: Vec<TaskList> = vec![serde_json::from_value(json!({
            "id": "l1",
            "title": "Groceries",
            "updated": "2025-10-01T08:00:00Z"
        }))
        .unwrap()];
        let output = format_task_lists(&lists);
        assert!(output.contains("Groceries"));
        assert!(output.contains("ID: l1"));
        assert!(output.contains("Updated: 2025-10-01 08:00"));
    }

    #[test]
    fn test_format_comments_with_reply_and_status() {
        let comments: Vec<Comment> = vec![serde_json::from_value(json!({
            "id": "c1",
            "content": "Looks wrong",
            "author": {"displayName": "Alice"},
            "resolved": true,
            "quotedFileContent": {"value": "the quarterly total"},
            "replies": [
                {"author": {"displayName": "Bob"}, "content": "Fixed now"}
            ]
        }))
        .unwrap()];
        let output = format_comments(&comments);
        assert!(output.contains("Alice [RESOLVED]"));
        assert!(output.contains("\"the quarterly total\""));
        assert!(output.contains("-> Bob"));
        assert!(output.contains("Fixed now"));
        assert!(output.contains("Total comments: 1"));
    }

    #[test]
    fn test_format_comments_empty() {
        assert_eq!(format_comments(&[]), "No comments found.");
    }

    #[test]
    fn test_format_info_basic_fields() {
        let metadata = file(json!({
            "id": "f1",
            "name": "Plan",
            "mimeType": "application/vnd.google-apps.document",
            "size": "1024",
            "webViewLink": "https://docs.google.com/document/d/f1/edit"
        }));
        let output = format_info_basic(&metadata);
        assert!(output.contains("FILE INFORMATION"));
        assert!(output.contains("Name: Plan"));
        assert!(output.contains("Size: 1.0 KB"));
        assert!(output.contains("Web Link: https://docs.google.com/document/d/f1/edit"));
    }

    #[test]
    fn test_format_info_detailed_permissions_and_capabilities() {
        let metadata = file(json!({
            "id": "f1",
            "owners": [{"displayName": "Alice", "emailAddress": "alice@example.com"}],
            "shared": true,
            "permissions": [
                {"type": "user", "role": "writer", "emailAddress": "bob@example.com", "displayName": "Bob"},
                {"type": "anyone", "role": "reader"}
            ],
            "capabilities": {"canEdit": true, "canDelete": false}
        }));
        let output = format_info_detailed(&metadata);
        assert!(output.contains("Alice (alice@example.com)"));
        assert!(output.contains("Bob (bob@example.com): writer"));
        assert!(output.contains("Anyone with link: reader"));
        assert!(output.contains("Edit: ✓ Yes"));
        assert!(output.contains("Delete: ✗ No"));
    }

    #[test]
    fn test_format_headings_indent_by_level() {
        let headings = vec![
            Heading { level: "1".into(), text: "Top".into() },
            Heading { level: "2".into(), text: "Nested".into() },
        ];
        let output = format_headings(&headings);
        assert!(output.contains("  - Top"));
        assert!(output.contains("    - Nested"));
    }

    #[test]
    fn test_format_tabs_and_sheets() {
        let tabs = vec![DocTab { id: "t.0".into(), title: "Intro".into(), index: 0 }];
        assert!(format_tabs(&tabs).contains("Intro (ID: t.0)"));
        assert_eq!(format_tabs(&[]), "No tabs found.");

        let sheets = vec![SheetInfo { id: 7, title: "Data".into(), index: 0 }];
        assert!(format_sheets(&sheets).contains("Data (ID: 7)"));
        assert_eq!(format_sheets(&[]), "No sheets found.");
    }
}
