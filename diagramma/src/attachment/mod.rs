//! Attachment handling: media-type gating, data-URI encoding, previews.

mod encode;
mod preview;

pub use encode::{decode_data_uri, encode_all, encode_file, AttachmentSource};
pub use preview::{PreviewHandle, PreviewRegistry};

/// Whether a media type may be attached at all. The input boundary accepts
/// images and PDFs only; anything else is rejected before encoding.
pub fn accepted_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/") || media_type == "application/pdf"
}

/// Guess a media type from a file extension. Used by the CLI surface, where
/// there is no browser to supply one.
pub fn media_type_for_path(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn accepts_images_and_pdf_only() {
        assert!(accepted_media_type("image/png"));
        assert!(accepted_media_type("image/svg+xml"));
        assert!(accepted_media_type("application/pdf"));
        assert!(!accepted_media_type("text/plain"));
        assert!(!accepted_media_type("application/zip"));
        assert!(!accepted_media_type("video/mp4"));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for_path(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(
            media_type_for_path(Path::new("doc.pdf")),
            Some("application/pdf")
        );
        assert_eq!(media_type_for_path(Path::new("notes.txt")), None);
        assert_eq!(media_type_for_path(Path::new("noext")), None);
    }
}
