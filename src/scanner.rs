//! Directory scanner: discover image files to seed the queue.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico",
];

pub fn is_image_ext(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(is_image_ext)
        .unwrap_or(false)
}

/// Recursively discover image files under `root`, sorted by path so the
/// queue order is stable across runs.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_image(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

/// Queue entries for discovered paths: the label is the file name.
pub fn to_entries(paths: Vec<PathBuf>) -> Vec<(PathBuf, String)> {
    paths
        .into_iter()
        .map(|p| {
            let label = p
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.display().to_string());
            (p, label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // ── extension filtering ─────────────────────────────────────────────

    #[test]
    fn image_exts_accepted() {
        for ext in &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico"] {
            assert!(is_image_ext(ext), "{} should be an image", ext);
        }
    }

    #[test]
    fn image_ext_case_insensitive() {
        assert!(is_image_ext("JPG"));
        assert!(is_image_ext("Png"));
        assert!(is_image_ext("WebP"));
    }

    #[test]
    fn non_image_exts_rejected() {
        for ext in &["txt", "pdf", "mp4", "mkv", "rs", "json", "zip", "svg"] {
            assert!(!is_image_ext(ext), "{} should NOT be an image", ext);
        }
    }

    #[test]
    fn is_image_path_forms() {
        assert!(is_image(Path::new("/a/photo.jpg")));
        assert!(is_image(Path::new("vacation pic.PNG")));
        assert!(!is_image(Path::new("/a/clip.mp4")));
        assert!(!is_image(Path::new("/a/noext")));
        assert!(!is_image(Path::new("/a/.hidden")));
    }

    // ── discover ────────────────────────────────────────────────────────

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = discover(dir.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn discover_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("deep.webp"), b"x").unwrap();

        let found = discover(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("nested/deep.webp"));
    }

    #[test]
    fn discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).is_empty());
    }

    #[test]
    fn to_entries_uses_file_name_as_label() {
        let entries = to_entries(vec![PathBuf::from("/pics/holiday/beach.jpg")]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, "beach.jpg");
    }
}
