//! Attachment type detection from magic bytes

use infer::MatcherType;

/// Attachment categories understood by the v2 loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentType {
    Audio,
    Image,
    Document,
}

impl AttachmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for AttachmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the MIME type of attachment content by its leading bytes
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}

/// Classify attachment content as audio, image or document
pub fn detect_attachment_type(data: &[u8]) -> AttachmentType {
    match infer::get(data).map(|kind| kind.matcher_type()) {
        Some(MatcherType::Audio) => AttachmentType::Audio,
        Some(MatcherType::Image) => AttachmentType::Image,
        _ => AttachmentType::Document,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images() {
        assert_eq!(detect_mime_type(b"\xFF\xD8\xFF\xE0\0\x10JFIF"), Some("image/jpeg"));
        assert_eq!(
            detect_attachment_type(b"\x89PNG\r\n\x1A\n\0\0\0\rIHDR"),
            AttachmentType::Image
        );
        assert_eq!(detect_attachment_type(b"RIFF\0\0\0\0WEBPVP8 "), AttachmentType::Image);
    }

    #[test]
    fn test_audio() {
        assert_eq!(detect_attachment_type(b"ID3\x04\0\0\0\0\0\0"), AttachmentType::Audio);
        assert_eq!(detect_attachment_type(b"RIFF\0\0\0\0WAVEfmt "), AttachmentType::Audio);
        assert_eq!(detect_attachment_type(b"fLaC\0\0\0\x22"), AttachmentType::Audio);
    }

    #[test]
    fn test_documents() {
        assert_eq!(detect_mime_type(b"%PDF-1.4"), Some("application/pdf"));
        assert_eq!(detect_attachment_type(b"%PDF-1.4"), AttachmentType::Document);
        assert_eq!(detect_attachment_type(b"plain text"), AttachmentType::Document);
        assert_eq!(detect_attachment_type(b""), AttachmentType::Document);
    }
}
