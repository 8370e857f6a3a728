//! Utility functions for key building and content types

use std::path::Path;

/// Fallback content type for unknown extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Get content type from file extension
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Format bytes as human readable string
pub fn format_bytes(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Collapse a slash separated path into its segments.
///
/// Empty and `.` segments are dropped; `..` removes the previous segment but
/// never climbs above the first one.
fn clean_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

/// Normalize a key: no leading slash, no `.`/`..` and no empty segments.
///
/// Only `/` separates segments; a backslash is an ordinary key character.
pub fn clean_key(key: &str) -> String {
    clean_segments(key).join("/")
}

/// Join a key prefix and a relative name into a normalized key.
///
/// Each side is cleaned on its own so `..` in the name cannot escape the
/// prefix.
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = clean_key(prefix);
    let name = clean_key(name);

    if prefix.is_empty() {
        name
    } else if name.is_empty() {
        prefix
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Convert a relative filesystem path to a forward slash string
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("file.txt")), "text/plain");
        assert_eq!(guess_content_type(Path::new("dir/image.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("app.json")), "application/json");
        assert_eq!(guess_content_type(Path::new("index.HTML")), "text/html");
        assert_eq!(guess_content_type(Path::new("unknown.zzqx")), OCTET_STREAM);
        assert_eq!(guess_content_type(Path::new("Makefile")), OCTET_STREAM);
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "file.txt"), "file.txt");
        assert_eq!(join_key("prefix", "file.txt"), "prefix/file.txt");
        assert_eq!(join_key("prefix/", "file.txt"), "prefix/file.txt");
        assert_eq!(join_key("/a//b/", "./c/d.txt"), "a/b/c/d.txt");
        assert_eq!(join_key("pre", ""), "pre");
    }

    #[test]
    fn test_join_key_stays_under_prefix() {
        assert_eq!(join_key("pre", "../../etc/passwd"), "pre/etc/passwd");
        assert_eq!(join_key("pre", "a/../b.txt"), "pre/b.txt");
        assert_eq!(join_key("a/b/../c", "f"), "a/c/f");
    }

    #[test]
    fn test_clean_key() {
        assert_eq!(clean_key("a\\b\\c.txt"), "a\\b\\c.txt");
        assert_eq!(clean_key("d/./a\\b.txt"), "d/a\\b.txt");
        assert_eq!(clean_key("./."), "");
        assert_eq!(clean_key("//x//"), "x");
    }

    #[test]
    fn test_to_slash() {
        let path: PathBuf = ["d", "sub", "b.txt"].iter().collect();
        assert_eq!(to_slash(&path), "d/sub/b.txt");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1 KiB");
        assert_eq!(format_bytes(1024 * 1024), "1 MiB");
    }
}
