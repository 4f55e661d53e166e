//! Supported-format filter.
//!
//! Pure predicate over a path's extension; no I/O. Runs synchronously
//! on the watcher's event loop, so it must stay cheap.

use std::path::Path;

/// Extension-based filter for recording files.
#[derive(Debug, Clone)]
pub struct FormatFilter {
    extensions: Vec<String>,
}

impl FormatFilter {
    /// Create a filter from a set of extensions (without leading dots).
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Check whether a path names a supported recording format.
    ///
    /// Comparison is case-insensitive; a path without an extension is
    /// never supported.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn video_filter() -> FormatFilter {
        FormatFilter::new(vec![
            "mp4".to_string(),
            "mkv".to_string(),
            "avi".to_string(),
            "mov".to_string(),
            "webm".to_string(),
        ])
    }

    #[test]
    fn test_supported_extension_case_insensitive() {
        let filter = video_filter();
        assert!(filter.is_supported(&PathBuf::from("a.MP4")));
        assert!(filter.is_supported(&PathBuf::from("meeting.mkv")));
        assert!(filter.is_supported(&PathBuf::from("/tmp/call.WebM")));
    }

    #[test]
    fn test_unsupported_extension() {
        let filter = video_filter();
        assert!(!filter.is_supported(&PathBuf::from("a.txt")));
        assert!(!filter.is_supported(&PathBuf::from("notes.md")));
    }

    #[test]
    fn test_no_extension() {
        let filter = video_filter();
        assert!(!filter.is_supported(&PathBuf::from("a")));
        assert!(!filter.is_supported(&PathBuf::from("/tmp/")));
    }
}
