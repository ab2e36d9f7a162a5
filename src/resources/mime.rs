//! File extension → MIME type lookup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

fn table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            ("html", "text/html"),
            ("htm", "text/html"),
            ("css", "text/css"),
            ("js", "text/javascript"),
            ("json", "application/json"),
            ("txt", "text/plain"),
            ("properties", "text/plain"),
            ("png", "image/png"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("gif", "image/gif"),
            ("svg", "image/svg+xml"),
            ("ico", "image/x-icon"),
            ("ttf", "application/x-font-ttf"),
            ("woff", "font/woff"),
            ("woff2", "font/woff2"),
        ]
        .into_iter()
        .collect()
    })
}

/// MIME type for a resource name, by extension (case-insensitive).
pub fn mime_type(resource_name: &str) -> &'static str {
    Path::new(resource_name.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| table().get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_type("/index.html"), "text/html");
        assert_eq!(mime_type("/css/site.css"), "text/css");
        assert_eq!(mime_type("app.js"), "text/javascript");
        assert_eq!(mime_type("/app.properties"), "text/plain");
        assert_eq!(mime_type("/fonts/a.ttf"), "application/x-font-ttf");
    }

    #[test]
    fn extension_match_ignores_case() {
        assert_eq!(mime_type("/LOGO.PNG"), "image/png");
    }

    #[test]
    fn unknown_or_missing_extension_is_octet_stream() {
        assert_eq!(mime_type("/archive.tar.zst"), APPLICATION_OCTET_STREAM);
        assert_eq!(mime_type("/Makefile"), APPLICATION_OCTET_STREAM);
        assert_eq!(mime_type(""), APPLICATION_OCTET_STREAM);
    }
}
