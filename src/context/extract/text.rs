use anyhow::Result;
use encoding_rs::{UTF_8, WINDOWS_1252};
use log::debug;

/// Decodes raw bytes as UTF-8, falling back to a single-byte decode that accepts any
/// input rather than rejecting the file.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return Ok(text.into_owned());
    }

    debug!("Input is not valid UTF-8, decoding as windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    Ok(text.into_owned())
}

/// Markdown is passed through as source; the model reads it directly.
pub fn read_markdown(bytes: &[u8]) -> Result<String> {
    decode_text(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFcaf\xC3\xA9";
        assert_eq!(decode_text(bytes).unwrap(), "café");
    }

    #[test]
    fn latin1_bytes_fall_back_instead_of_failing() {
        let bytes = b"caf\xE9 na\xEFve";
        assert_eq!(decode_text(bytes).unwrap(), "café naïve");
    }

    #[test]
    fn markdown_is_not_rendered() {
        let source = "# Title\n\n- item **bold**\n";
        assert_eq!(read_markdown(source.as_bytes()).unwrap(), source);
    }
}
