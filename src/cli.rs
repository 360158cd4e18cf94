// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drivectl")]
#[command(about = "Command-line utilities for Google Drive, Docs, Sheets, and Tasks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the configuration directory
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Export a Google Doc as markdown or a Google Sheet as CSV
    Export {
        /// Google Drive file ID or full URL
        file: String,

        /// Output file path or directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export all tabs as separate files (Google Docs only)
        #[arg(long)]
        all_tabs: bool,
    },

    /// Download a file from Google Drive (for non-Google Doc files)
    Download {
        /// Google Drive file ID or full URL
        file: String,

        /// Output file path (default: current directory with original name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show file metadata
    Info {
        /// Google Drive file ID or full URL
        file: String,

        /// Show detailed information (permissions, sharing, capabilities, comments)
        #[arg(short, long)]
        verbose: bool,

        /// Show comments (automatically enabled with -v)
        #[arg(long)]
        show_comments: bool,
    },

    /// List files from Google Drive
    List {
        /// Search query (searches in name and content)
        #[arg(short, long)]
        query: Option<String>,

        /// Filter by type (docs, sheets, slides, folders, or a MIME type)
        #[arg(short = 't', long = "type")]
        file_type: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 20)]
        max_results: u32,

        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,

        /// Sort order
        #[arg(long, default_value = "modifiedTime desc")]
        order_by: String,
    },

    /// List Google Tasks
    Tasks {
        /// Task list ID (@default for your default task list)
        #[arg(short = 'l', long, default_value = "@default")]
        list_id: String,

        /// Maximum number of tasks to return
        #[arg(short = 'n', long, default_value_t = 100)]
        max_results: u32,

        /// Include completed tasks
        #[arg(short = 'c', long)]
        show_completed: bool,

        /// Show detailed task information
        #[arg(short, long)]
        verbose: bool,

        /// Show all task lists instead of tasks
        #[arg(long)]
        list_all_lists: bool,
    },

    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthAction {
    /// Run the interactive authorization flow
    Login,
    /// Delete stored credentials
    Revoke,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_with_flags() {
        let cli = Cli::try_parse_from(["drivectl", "export", "abc123", "-o", "out", "--all-tabs"])
            .unwrap();
        match cli.command {
            Commands::Export { file, output, all_tabs } => {
                assert_eq!(file, "abc123");
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(all_tabs);
            }
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["drivectl", "list"]).unwrap();
        match cli.command {
            Commands::List { query, file_type, max_results, verbose, order_by } => {
                assert!(query.is_none());
                assert!(file_type.is_none());
                assert_eq!(max_results, 20);
                assert!(!verbose);
                assert_eq!(order_by, "modifiedTime desc");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tasks_defaults() {
        let cli = Cli::try_parse_from(["drivectl", "tasks"]).unwrap();
        match cli.command {
            Commands::Tasks { list_id, max_results, show_completed, .. } => {
                assert_eq!(list_id, "@default");
                assert_eq!(max_results, 100);
                assert!(!show_completed);
            }
            other => panic!("expected tasks, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_auth_subcommands() {
        let cli = Cli::try_parse_from(["drivectl", "auth", "revoke"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth { action: AuthAction::Revoke }
        ));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["drivectl"]).is_err());
    }
}
