// ABOUTME: Top-level command handlers behind the CLI surface
// ABOUTME: Validates input, authenticates, calls the API, and prints results

use crate::api::{ApiClient, ListQuery};
use crate::auth::{self, CredentialStore};
use crate::cli::{AuthAction, Cli, Commands};
use crate::model::{MIME_DOCUMENT, MIME_FOLDER, MIME_PRESENTATION, MIME_SPREADSHEET};
use crate::retry::RetryPolicy;
use crate::storage::Paths;
use crate::{docs, download, format, sheets, util, Error, Result};
use std::path::Path;

pub fn run(cli: Cli) -> Result<()> {
    let paths = Paths::new(cli.config_dir)?;

    match cli.command {
        Commands::Export { file, output, all_tabs } => {
            cmd_export(&paths, &file, output.as_deref(), all_tabs)
        }
        Commands::Download { file, output } => cmd_download(&paths, &file, output.as_deref()),
        Commands::Info { file, verbose, show_comments } => {
            cmd_info(&paths, &file, verbose, show_comments)
        }
        Commands::List { query, file_type, max_results, verbose, order_by } => {
            cmd_list(&paths, query, file_type, max_results, verbose, order_by)
        }
        Commands::Tasks {
            list_id,
            max_results,
            show_completed,
            verbose,
            list_all_lists,
        } => cmd_tasks(&paths, &list_id, max_results, show_completed, verbose, list_all_lists),
        Commands::Auth { action } => cmd_auth(&paths, action),
    }
}

/// Obtain credentials and build the API client. Input validation happens
/// before this so bad identifiers never trigger an auth round-trip.
fn connect(paths: &Paths) -> Result<ApiClient> {
    let creds = auth::obtain(paths)?;
    ApiClient::new(creds.access_token)
}

fn cmd_export(paths: &Paths, file: &str, output: Option<&Path>, all_tabs: bool) -> Result<()> {
    let file_id = util::extract_file_id(file)?;
    let client = connect(paths)?;
    let metadata = client.get_file_metadata(&file_id, false)?;

    if metadata.is_spreadsheet() {
        let output_dir = output.unwrap_or(Path::new("."));
        eprintln!("Exporting spreadsheet to: {}", output_dir.display());

        let exported = sheets::export_spreadsheet_csv(
            &client,
            &file_id,
            output_dir,
            &RetryPolicy::default(),
            sheets::DEFAULT_SHEET_DELAY,
        )?;

        eprintln!("\nSuccessfully exported {} sheet(s):", exported.len());
        for path in &exported {
            eprintln!("  - {}", path.display());
        }
        Ok(())
    } else if metadata.is_document() {
        if all_tabs {
            let output_dir = output.unwrap_or(Path::new("."));
            eprintln!("Exporting all tabs to: {}", output_dir.display());

            let exported = docs::export_all_tabs(&client, &file_id, output_dir)?;

            eprintln!("\nSuccessfully exported {} tab(s):", exported.len());
            for path in &exported {
                eprintln!("  - {}", path.display());
            }
            Ok(())
        } else {
            let path = download::export_doc_markdown(&client, &metadata, output)?;
            eprintln!("Exported to: {}", path.display());
            Ok(())
        }
    } else {
        Err(Error::Unsupported(format!(
            "Unsupported file type: {}. Export supports Google Docs (markdown) and Google Sheets (CSV).",
            metadata.mime()
        )))
    }
}

fn cmd_download(paths: &Paths, file: &str, output: Option<&Path>) -> Result<()> {
    let file_id = util::extract_file_id(file)?;
    let client = connect(paths)?;
    let path = download::download_file(&client, &file_id, output)?;
    eprintln!("Downloaded to: {}", path.display());
    Ok(())
}

fn cmd_info(paths: &Paths, file: &str, verbose: bool, show_comments: bool) -> Result<()> {
    let file_id = util::extract_file_id(file)?;
    let client = connect(paths)?;
    let metadata = client.get_file_metadata(&file_id, verbose)?;

    println!("{}", format::format_info_basic(&metadata));

    if verbose {
        println!("{}", format::format_info_detailed(&metadata));

        if metadata.is_document() {
            match client.get_document(&file_id, true) {
                Ok(document) => {
                    println!("\n{}\n", format::section("DOCUMENT STRUCTURE"));

                    let tabs = docs::list_tabs(&document);
                    println!("Tabs ({}):", tabs.len());
                    println!("{}", format::format_tabs(&tabs));

                    let outline = docs::document_outline(&document);
                    if !outline.is_empty() {
                        println!("\nHeadings ({}):", outline.len());
                        println!("{}", format::format_headings(&outline));
                    }
                }
                Err(e) => println!("\nNote: Could not retrieve document structure: {e}"),
            }
        }

        if metadata.is_spreadsheet() {
            match client.get_spreadsheet(&file_id) {
                Ok(spreadsheet) => {
                    let sheet_list = sheets::sheet_infos(&spreadsheet);
                    println!("\n{}\n", format::section("SPREADSHEET STRUCTURE"));
                    println!("Sheets ({}):", sheet_list.len());
                    println!("{}", format::format_sheets(&sheet_list));
                }
                Err(e) => println!("\nNote: Could not retrieve spreadsheet structure: {e}"),
            }
        }
    }

    if verbose || show_comments {
        match client.list_comments(&file_id) {
            Ok(comments) => {
                println!("\n{}", format::section("COMMENTS"));
                if comments.is_empty() {
                    println!("\nNo comments on this file.");
                } else {
                    println!("{}", format::format_comments(&comments));
                }
            }
            Err(e) => println!("\nNote: Could not retrieve comments: {e}"),
        }
    }

    println!("\n{}\n", format::separator());
    Ok(())
}

fn cmd_list(
    paths: &Paths,
    query: Option<String>,
    file_type: Option<String>,
    max_results: u32,
    verbose: bool,
    order_by: String,
) -> Result<()> {
    let client = connect(paths)?;

    let list_query = ListQuery {
        query,
        mime_type: file_type.map(|t| resolve_type_shortcut(&t)),
        max_results,
        order_by,
        include_trashed: false,
    };
    let files = client.list_files(&list_query)?;

    println!("{}", format::format_file_list(&files, verbose));
    if !files.is_empty() {
        eprintln!("\nFound {} file(s)", files.len());
    }
    Ok(())
}

fn cmd_tasks(
    paths: &Paths,
    list_id: &str,
    max_results: u32,
    show_completed: bool,
    verbose: bool,
    list_all_lists: bool,
) -> Result<()> {
    let client = connect(paths)?;

    if list_all_lists {
        let task_lists = client.list_task_lists(max_results)?;
        println!("{}", format::format_task_lists(&task_lists));
        if !task_lists.is_empty() {
            eprintln!("Found {} task list(s)", task_lists.len());
        }
        return Ok(());
    }

    let tasks = client.list_tasks(list_id, max_results, show_completed)?;
    println!("{}", format::format_tasks(&tasks, verbose));
    if !tasks.is_empty() {
        eprintln!("Found {} task(s)", tasks.len());
    }
    Ok(())
}

fn cmd_auth(paths: &Paths, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login => {
            // Drop any stored record so the full flow runs again.
            CredentialStore::new(paths.token_path.clone()).clear()?;
            auth::obtain(paths)?;
            eprintln!("Authentication complete.");
            Ok(())
        }
        AuthAction::Revoke => {
            if auth::revoke(paths)? {
                eprintln!("Removed credentials from {}", paths.token_path.display());
            } else {
                eprintln!("No credentials found to revoke");
            }
            Ok(())
        }
    }
}

/// Map the list command's type shortcuts to MIME types; anything else is
/// passed through as a literal MIME type.
fn resolve_type_shortcut(value: &str) -> String {
    match value.to_lowercase().as_str() {
        "docs" => MIME_DOCUMENT.to_string(),
        "sheets" => MIME_SPREADSHEET.to_string(),
        "slides" => MIME_PRESENTATION.to_string(),
        "folders" => MIME_FOLDER.to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_type_shortcuts() {
        assert_eq!(resolve_type_shortcut("docs"), MIME_DOCUMENT);
        assert_eq!(resolve_type_shortcut("SHEETS"), MIME_SPREADSHEET);
        assert_eq!(resolve_type_shortcut("slides"), MIME_PRESENTATION);
        assert_eq!(resolve_type_shortcut("folders"), MIME_FOLDER);
    }

    #[test]
    fn test_resolve_type_passthrough() {
        assert_eq!(resolve_type_shortcut("application/pdf"), "application/pdf");
    }
}
