use anyhow::{Context, Result};

/// Text of every page, each preceded by a `--- Page N ---` marker.
pub fn read_pdf(bytes: &[u8]) -> Result<String> {
    let pages =
        pdf_extract::extract_text_from_mem_by_pages(bytes).context("Failed to parse PDF")?;

    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            text.push_str("\n\n");
        }
        text.push_str(&format!("--- Page {} ---\n", index + 1));
        text.push_str(page.trim());
    }

    Ok(text)
}
