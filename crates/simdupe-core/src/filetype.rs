use serde::{Deserialize, Serialize};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "svg",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "js", "ts", "py", "java", "cpp", "c", "h", "css", "html", "xml", "yml",
    "yaml", "sql", "sh", "bat", "ps1", "rs", "go", "php", "rb", "cs", "kt", "swift",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "doc", "xlsx", "xls", "pptx", "ppt", "odt", "ods", "odp",
];

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Coarse classification used to decide which fingerprints apply to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Text,
    Document,
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let ext = match extension(name) {
            Some(ext) => ext,
            None => return FileKind::Other,
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Image
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Text
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Document
        } else {
            FileKind::Other
        }
    }
}

/// Lower-cased extension without the dot, if any.
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

pub fn mime_type_for(name: &str) -> &'static str {
    let ext = match extension(name) {
        Some(ext) => ext,
        None => return DEFAULT_MIME_TYPE,
    };

    match ext.as_str() {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "js" => "application/javascript",
        "ts" => "application/typescript",
        "html" => "text/html",
        "css" => "text/css",
        "xml" => "application/xml",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tiff" | "tif" => "image/tiff",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        _ => DEFAULT_MIME_TYPE,
    }
}
