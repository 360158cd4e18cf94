// ABOUTME: Markdown export for Google Docs and byte download for plain files
// ABOUTME: Resolves output paths from titles and streams bodies with progress

use crate::api::ApiClient;
use crate::model::FileMetadata;
use crate::util::sanitize_filename;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Export a Google Doc as markdown through the native conversion endpoint.
/// Returns the path written.
pub fn export_doc_markdown(
    client: &ApiClient,
    metadata: &FileMetadata,
    output: Option<&Path>,
) -> Result<PathBuf> {
    if !metadata.is_document() {
        return Err(Error::Unsupported(format!(
            "File is not a Google Doc (mime type: {}). Use the 'download' command for other file types.",
            metadata.mime()
        )));
    }

    let content = client.export_file(&metadata.id, "text/markdown")?.text()?;

    let safe_name = sanitize_filename(metadata.display_name());
    let output_file = resolve_markdown_path(output, &safe_name);
    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output_file, content)?;

    Ok(output_file)
}

fn resolve_markdown_path(output: Option<&Path>, safe_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(format!("{safe_name}.md")),
        Some(path) if path.extension().is_none() => path.with_extension("md"),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(format!("{safe_name}.md")),
    }
}

/// Download an ordinary (non Google-native) file's bytes to disk.
/// Returns the path written.
pub fn download_file(
    client: &ApiClient,
    file_id: &str,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let metadata = client.get_file_metadata(file_id, false)?;

    if metadata.is_google_native() {
        return Err(Error::Unsupported(format!(
            "This is a Google {}. Use 'export' command with appropriate format.",
            metadata.type_display()
        )));
    }

    let safe_name = sanitize_filename(metadata.display_name());
    let output_file = match output {
        Some(path) if path.is_dir() => path.join(&safe_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&safe_name),
    };
    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let response = client.download_media(file_id)?;
    let total = response.content_length().or(metadata.size_bytes());

    let pb = match total {
        Some(len) => ProgressBar::new(len).with_style(
            ProgressStyle::default_bar()
                .template("[{bar:40}] {bytes}/{total_bytes}")
                .unwrap()
                .progress_chars("##-"),
        ),
        None => ProgressBar::new_spinner(),
    };

    let mut reader = pb.wrap_read(response);
    let mut file = fs::File::create(&output_file)?;
    std::io::copy(&mut reader, &mut file)?;
    pb.finish_and_clear();

    Ok(output_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_markdown_path_default_uses_title() {
        assert_eq!(
            resolve_markdown_path(None, "My Doc"),
            PathBuf::from("My Doc.md")
        );
    }

    #[test]
    fn test_resolve_markdown_path_into_directory() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_markdown_path(Some(temp.path()), "My Doc");
        assert_eq!(resolved, temp.path().join("My Doc.md"));
    }

    #[test]
    fn test_resolve_markdown_path_adds_extension() {
        let resolved = resolve_markdown_path(Some(Path::new("/tmp/out/notes")), "x");
        assert_eq!(resolved, PathBuf::from("/tmp/out/notes.md"));
    }

    #[test]
    fn test_resolve_markdown_path_keeps_explicit_extension() {
        let resolved = resolve_markdown_path(Some(Path::new("notes.markdown")), "x");
        assert_eq!(resolved, PathBuf::from("notes.markdown"));
    }
}
