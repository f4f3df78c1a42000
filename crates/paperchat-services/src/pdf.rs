//! PDF page extraction and direct PDF construction.
//!
//! Extraction walks every page so the page count matches what a viewer
//! reports; a page whose text layer is empty or undecodable still counts,
//! it just contributes empty content. Construction builds a minimal
//! left-aligned text document, one content stream per page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use paperchat_core::models::DocumentPage;
use paperchat_core::AppError;

/// US Letter, 1 inch margins, 12pt Helvetica with 14pt leading.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const FONT_SIZE: i64 = 12;
const LEADING: i64 = 14;

/// Maximum characters per rendered line before wrapping.
pub const MAX_LINE_CHARS: usize = 90;

/// Lines that fit between the top and bottom margins at [`LEADING`].
pub const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Extract per-page text from PDF bytes. Returns one entry per page in
/// document order, 1-based page numbers.
pub fn extract_pages(data: &[u8]) -> Result<Vec<DocumentPage>, AppError> {
    let document = Document::load_mem(data)
        .map_err(|e| AppError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

    let mut pages = Vec::new();
    for (page_number, _object_id) in document.get_pages() {
        let content = document
            .extract_text(&[page_number])
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        pages.push(DocumentPage {
            page_number,
            content,
        });
    }

    if pages.is_empty() {
        return Err(AppError::PdfProcessing(
            "PDF contains no pages".to_string(),
        ));
    }

    Ok(pages)
}

/// Build a PDF containing `text` verbatim, left-aligned, paginating at
/// [`LINES_PER_PAGE`]. Returns the serialized bytes.
pub fn build_pdf(text: &str) -> Result<Vec<u8>, AppError> {
    let lines = wrap_text(text, MAX_LINE_CHARS);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[0..0]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    for chunk in &chunks {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
        ];
        for (i, line) in chunk.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        }
        operations.push(Operation::new("ET", vec![]));

        let encoded = Content { operations }
            .encode()
            .map_err(|e| AppError::PdfProcessing(format!("Failed to encode page: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AppError::PdfProcessing(format!("Failed to serialize PDF: {}", e)))?;

    Ok(buffer)
}

/// Split on newlines, then greedily wrap each logical line at `max_chars`,
/// breaking at whitespace where possible.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for logical in text.lines() {
        if logical.chars().count() <= max_chars {
            lines.push(logical.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        for word in logical.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if word_len > max_chars {
                // A single over-long token gets hard-broken.
                for piece in word
                    .chars()
                    .collect::<Vec<_>>()
                    .chunks(max_chars)
                    .map(|c| c.iter().collect::<String>())
                {
                    if current_len > 0 {
                        lines.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    current = piece;
                    current_len = current.chars().count();
                    if current_len == max_chars {
                        lines.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                }
                continue;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_preserves_short_lines() {
        let lines = wrap_text("hello\nworld", 90);
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn test_wrap_text_wraps_long_lines_at_whitespace() {
        let text = "aaa bbb ccc ddd";
        let lines = wrap_text(text, 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_wrap_text_hard_breaks_long_tokens() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_build_pdf_produces_pdf_header() {
        let bytes = build_pdf("Hello, world!").unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_build_then_extract_single_page() {
        let bytes = build_pdf("Hello, world!").unwrap();
        let pages = extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert!(pages[0].content.contains("Hello, world!"));
    }

    #[test]
    fn test_build_paginates_long_text() {
        // Three pages exactly: LINES_PER_PAGE short lines per page.
        let text = (0..LINES_PER_PAGE * 3)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = build_pdf(&text).unwrap();
        let pages = extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn test_build_pdf_empty_text_yields_one_page() {
        let bytes = build_pdf("").unwrap();
        let pages = extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content, "");
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_pages(b"not a pdf").is_err());
    }
}
