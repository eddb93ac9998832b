//! Inline attachment handling: data URI parsing, document type inference and
//! multimodal content parts for the completion endpoint.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

/// Coarse document label passed to the extraction flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Pdf,
    Image,
    ZipArchive,
    General,
}

impl DocumentType {
    /// Infer the label from a file name's extension (case-insensitive).
    pub fn infer(file_name: &str) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => DocumentType::Pdf,
            "jpeg" | "jpg" | "png" | "gif" | "webp" => DocumentType::Image,
            "zip" => DocumentType::ZipArchive,
            _ => DocumentType::General,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "PDF Document",
            DocumentType::Image => "Image",
            DocumentType::ZipArchive => "ZIP Archive",
            DocumentType::General => "General Document",
        }
    }
}

/// A parsed `data:<mime>[;base64],<payload>` URI, borrowing from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    pub is_base64: bool,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mut parts = header.split(';');
        let mime_type = parts.next().unwrap_or_default();
        let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));
        Some(Self {
            mime_type: if mime_type.is_empty() { "text/plain" } else { mime_type },
            is_base64,
            payload,
        })
    }

    /// Size of the decoded payload in bytes; `None` when the base64 is malformed.
    pub fn decoded_len(&self) -> Option<usize> {
        if self.is_base64 {
            STANDARD.decode(self.payload.trim()).ok().map(|bytes| bytes.len())
        } else {
            Some(self.payload.len())
        }
    }
}

pub fn is_remote_url(uri: &str) -> bool {
    uri.starts_with("https://") || uri.starts_with("http://")
}

/// MIME type of an attachment URI; remote URLs have none.
pub fn mime_type_of(uri: &str) -> Option<&str> {
    DataUri::parse(uri).map(|d| d.mime_type)
}

/// Images and PDFs can be handed to the model as inline media.
pub fn is_directly_processable(mime_type: &str) -> bool {
    let mime = mime_type.to_ascii_lowercase();
    mime.starts_with("image/") || mime == "application/pdf"
}

/// Whether an attachment can be inlined into a model request at all.
pub fn is_attachable(uri: &str) -> bool {
    is_remote_url(uri) || mime_type_of(uri).is_some_and(is_directly_processable)
}

/// Build the chat-completion content part carrying an attachment.
pub fn media_part(uri: &str, file_name: Option<&str>) -> Value {
    match mime_type_of(uri) {
        Some(mime) if !mime.to_ascii_lowercase().starts_with("image/") => json!({
            "type": "file",
            "file": {
                "filename": file_name.unwrap_or("attachment"),
                "file_data": uri
            }
        }),
        _ => json!({
            "type": "image_url",
            "image_url": { "url": uri }
        }),
    }
}
