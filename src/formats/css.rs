//! CSS stylesheets. Detected and ingested so they land in the store next to
//! the documents they style; they carry no text and have no IR.

pub(super) fn sniff(extension: Option<&str>, _head: &[u8]) -> std::result::Result<String, String> {
    match extension {
        Some("css") => Ok("file extension is .css".into()),
        _ => Err("file extension is not .css".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_by_extension() {
        assert!(sniff(Some("css"), b"p { margin: 0 }").is_ok());
        assert!(sniff(Some("html"), b"<style>p{}</style>").is_err());
    }
}
