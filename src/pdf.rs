use pdf_extract::extract_text_from_mem;

/// Extract plain text from PDF bytes. Extraction failures are embedded in the
/// returned text instead of propagating, so a law with an unreadable source
/// file still gets registered and the operator sees what went wrong.
pub fn extract_text(bytes: &[u8]) -> String {
    match extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(err) => format!("Error extracting text: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_bytes_embed_the_error() {
        let text = extract_text(b"not a pdf at all");
        assert!(text.starts_with("Error extracting text:"));
    }
}
