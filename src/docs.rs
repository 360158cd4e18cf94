// ABOUTME: Document tab discovery, text extraction, and per-tab export
// ABOUTME: Walks the content tree depth-first, preserving document order

use crate::api::ApiClient;
use crate::model::{Document, ParagraphElement, StructuralElement, Tab};
use crate::util::sanitize_filename;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Identifier of the synthesized tab for documents that report none.
pub const DEFAULT_TAB_ID: &str = "default";

#[derive(Debug, Clone)]
pub struct DocTab {
    pub id: String,
    pub title: String,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Heading {
    pub level: String,
    pub text: String,
}

/// List a document's tabs. A document without explicit tabs yields one
/// implicit tab named after the document itself, backed by the body.
pub fn list_tabs(document: &Document) -> Vec<DocTab> {
    if document.tabs.is_empty() {
        return vec![DocTab {
            id: DEFAULT_TAB_ID.to_string(),
            title: document.title.clone().unwrap_or_else(|| "Untitled".into()),
            index: 0,
        }];
    }

    document
        .tabs
        .iter()
        .enumerate()
        .map(|(position, tab)| DocTab {
            id: resolve_tab_id(tab, position),
            title: resolve_tab_title(tab, position),
            index: tab
                .tab_properties
                .as_ref()
                .and_then(|p| p.index)
                .unwrap_or(position),
        })
        .collect()
}

/// Title source order: tab properties title, tab properties display name,
/// tab-level title, tab-level display name, positional label.
fn resolve_tab_title(tab: &Tab, position: usize) -> String {
    let props = tab.tab_properties.as_ref();
    props
        .and_then(|p| p.title.clone())
        .filter(|t| !t.is_empty())
        .or_else(|| props.and_then(|p| p.display_name.clone()).filter(|t| !t.is_empty()))
        .or_else(|| tab.title.clone().filter(|t| !t.is_empty()))
        .or_else(|| tab.display_name.clone().filter(|t| !t.is_empty()))
        .unwrap_or_else(|| format!("Tab {}", position + 1))
}

fn resolve_tab_id(tab: &Tab, position: usize) -> String {
    let props = tab.tab_properties.as_ref();
    props
        .and_then(|p| p.tab_id.clone())
        .filter(|t| !t.is_empty())
        .or_else(|| tab.tab_id.clone().filter(|t| !t.is_empty()))
        .unwrap_or_else(|| format!("tab_{position}"))
}

/// Concatenate all text-run contents under `elements`, depth first.
/// Paragraphs contribute their runs, tables contribute every cell's
/// sub-tree in row-major order, anything else contributes nothing.
pub fn extract_text(elements: &[StructuralElement]) -> String {
    let mut out = String::new();
    collect_text(elements, &mut out);
    out
}

fn collect_text(elements: &[StructuralElement], out: &mut String) {
    for element in elements {
        match element {
            StructuralElement::Paragraph { paragraph } => {
                for pe in &paragraph.elements {
                    if let ParagraphElement::TextRun { text_run } = pe {
                        out.push_str(&text_run.content);
                    }
                }
            }
            StructuralElement::Table { table } => {
                for row in &table.table_rows {
                    for cell in &row.table_cells {
                        collect_text(&cell.content, out);
                    }
                }
            }
            StructuralElement::Other(_) => {}
        }
    }
}

/// Plain text of one tab. The implicit default tab reads the document body.
pub fn tab_text(document: &Document, tab_id: &str) -> Result<String> {
    if document.tabs.is_empty() && tab_id == DEFAULT_TAB_ID {
        let content = document.body.as_ref().map(|b| b.content.as_slice());
        return Ok(extract_text(content.unwrap_or_default()));
    }

    for (position, tab) in document.tabs.iter().enumerate() {
        if resolve_tab_id(tab, position) == tab_id {
            let content = tab
                .document_tab
                .as_ref()
                .and_then(|dt| dt.body.as_ref())
                .map(|b| b.content.as_slice());
            return Ok(extract_text(content.unwrap_or_default()));
        }
    }

    Err(Error::InvalidInput(format!(
        "Tab {tab_id} not found in document"
    )))
}

/// Headings from the document body, for the outline view.
pub fn document_outline(document: &Document) -> Vec<Heading> {
    let Some(body) = &document.body else {
        return Vec::new();
    };

    body.content
        .iter()
        .filter_map(|element| {
            let StructuralElement::Paragraph { paragraph } = element else {
                return None;
            };
            let style = paragraph
                .paragraph_style
                .as_ref()?
                .named_style_type
                .as_deref()?;
            let level = style.strip_prefix("HEADING_")?;

            let text: String = paragraph
                .elements
                .iter()
                .filter_map(|pe| match pe {
                    ParagraphElement::TextRun { text_run } => Some(text_run.content.as_str()),
                    ParagraphElement::Other(_) => None,
                })
                .collect();

            Some(Heading {
                level: level.to_string(),
                text: text.trim().to_string(),
            })
        })
        .collect()
}

/// Export every tab as a text file under `output_dir`. Failing tabs are
/// logged and skipped; the returned paths are the ones that succeeded.
pub fn export_all_tabs(
    client: &ApiClient,
    document_id: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let document = client.get_document(document_id, true)?;
    let tabs = list_tabs(&document);

    let doc_title = document.title.as_deref().unwrap_or("document");
    let safe_title = sanitize_filename(doc_title);
    fs::create_dir_all(output_dir)?;

    let mut exported = Vec::new();
    for tab in &tabs {
        let filename = if tabs.len() == 1 {
            format!("{safe_title}.md")
        } else {
            format!("{} - {}.md", safe_title, sanitize_filename(&tab.title))
        };
        let path = output_dir.join(filename);

        let result = tab_text(&document, &tab.id).and_then(|text| {
            fs::write(&path, text)?;
            Ok(())
        });
        match result {
            Ok(()) => exported.push(path),
            Err(e) => eprintln!("Warning: Failed to export tab '{}': {}", tab.title, e),
        }
    }

    Ok(exported)
}
