use std::path::Path;

use mupdf::{Document, Page, TextPageFlags};

use takvimi_core::{PageLayout, PdfBackend, PdfReadError, TextToken};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the parsing and serving code does not
/// transitively depend on it.
///
/// Each structured-text line is split on whitespace into word tokens; a
/// token's box is the union of its characters' quads, translated so the page's
/// top-left corner is the origin.
#[derive(Debug, Default, Clone)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn open(path: &Path) -> Result<Document, PdfReadError> {
    if !path.is_file() {
        return Err(PdfReadError::NotFound(path.to_path_buf()));
    }
    let path_str = path
        .to_str()
        .ok_or_else(|| PdfReadError::Open("invalid path encoding".into()))?;
    Document::open(path_str).map_err(|e| PdfReadError::Open(e.to_string()))
}

fn count_pages(document: &Document) -> Result<usize, PdfReadError> {
    let count = document
        .page_count()
        .map_err(|e| PdfReadError::Open(e.to_string()))?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn layout_of(page: &Page, index: usize) -> Result<PageLayout, PdfReadError> {
    let fail = |e: mupdf::Error| PdfReadError::Extraction {
        page: index,
        message: e.to_string(),
    };
    let bounds = page.bounds().map_err(fail)?;
    let text_page = page.to_text_page(TextPageFlags::empty()).map_err(fail)?;

    let mut tokens = Vec::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let chars = line.chars().map(|ch| {
                let quad = ch.quad();
                CharBox {
                    ch: ch.char().unwrap_or('\u{FFFD}'),
                    x0: quad.ul.x.min(quad.ll.x) - bounds.x0,
                    y0: quad.ul.y.min(quad.ur.y) - bounds.y0,
                    x1: quad.ur.x.max(quad.lr.x) - bounds.x0,
                    y1: quad.ll.y.max(quad.lr.y) - bounds.y0,
                }
            });
            tokens.extend(words(chars));
        }
    }

    Ok(PageLayout {
        index,
        width: bounds.x1 - bounds.x0,
        height: bounds.y1 - bounds.y0,
        tokens,
    })
}

impl PdfBackend for MupdfBackend {
    fn page_count(&self, path: &Path) -> Result<usize, PdfReadError> {
        count_pages(&open(path)?)
    }

    fn extract_page(&self, path: &Path, page_index: usize) -> Result<PageLayout, PdfReadError> {
        let document = open(path)?;
        let count = count_pages(&document)?;
        if page_index >= count {
            return Err(PdfReadError::PageOutOfRange {
                index: page_index,
                count,
            });
        }
        let page = document
            .load_page(page_index as i32)
            .map_err(|e| PdfReadError::Extraction {
                page: page_index,
                message: e.to_string(),
            })?;
        layout_of(&page, page_index)
    }

    /// Opens the document once for all pages.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageLayout>, PdfReadError> {
        let document = open(path)?;
        let pages = document
            .pages()
            .map_err(|e| PdfReadError::Open(e.to_string()))?;
        let mut layouts = Vec::new();
        for (index, page) in pages.enumerate() {
            let page = page.map_err(|e| PdfReadError::Extraction {
                page: index,
                message: e.to_string(),
            })?;
            layouts.push(layout_of(&page, index)?);
        }
        tracing::debug!(path = %path.display(), pages = layouts.len(), "extracted page layouts");
        Ok(layouts)
    }
}

/// A glyph with its axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy)]
struct CharBox {
    ch: char,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

/// Group a line's glyphs into whitespace-separated words.
fn words(chars: impl IntoIterator<Item = CharBox>) -> Vec<TextToken> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut bbox: Option<(f32, f32, f32, f32)> = None;

    let mut flush = |text: &mut String, bbox: &mut Option<(f32, f32, f32, f32)>| {
        if let Some((x0, y0, x1, y1)) = bbox.take()
            && !text.is_empty()
        {
            out.push(TextToken::new(
                std::mem::take(text),
                x0,
                y0,
                (x1 - x0).max(0.0),
                (y1 - y0).max(0.0),
            ));
        }
        text.clear();
    };

    for c in chars {
        if c.ch.is_whitespace() {
            flush(&mut text, &mut bbox);
            continue;
        }
        text.push(c.ch);
        bbox = Some(match bbox {
            None => (c.x0, c.y0, c.x1, c.y1),
            Some((x0, y0, x1, y1)) => (x0.min(c.x0), y0.min(c.y0), x1.max(c.x1), y1.max(c.y1)),
        });
    }
    flush(&mut text, &mut bbox);
    out
}
