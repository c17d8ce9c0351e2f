//! MIME type detection module
//!
//! Maps file extensions to Content-Type values for static assets and stored objects.

/// Get MIME Content-Type based on file extension
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    lookup_content_type(extension).unwrap_or("application/octet-stream")
}

/// Look up the Content-Type for a known extension
///
/// Returns `None` for unknown extensions so callers can apply their own default.
pub fn lookup_content_type(extension: Option<&str>) -> Option<&'static str> {
    let content_type = match extension?.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(content_type)
}
