use std::fs;
use std::path::{Path, PathBuf};

use ignore::Walk;

/// Formats the service accepts; everything else is filtered out before it
/// can reach the upload endpoint and bounce with a 400.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// A file the guest has selected but not yet submitted. Size is read from
/// fs metadata at selection time and becomes the task's byte total.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl PendingFile {
    pub fn from_path(path: &Path) -> Option<Self> {
        if !is_image_file(path) {
            return None;
        }
        let name = path.file_name()?.to_str()?.to_string();
        let size = fs::metadata(path).ok()?.len();
        Some(Self {
            path: path.to_path_buf(),
            name,
            size,
        })
    }

    /// Stable identity within one batch.
    pub fn file_key(&self) -> String {
        format!("{}:{}", self.name, self.size)
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Gather every uploadable image under a folder, honoring ignore files the
/// same way the walk does everywhere else.
pub fn collect_image_files(folder: &Path) -> Vec<PendingFile> {
    let mut files = Vec::new();
    for entry in Walk::new(folder) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() {
                    if let Some(file) = PendingFile::from_path(path) {
                        files.push(file);
                    }
                }
            }
            Err(err) => {
                eprintln!("Skipping unreadable entry: {}", err);
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions_are_case_insensitive() {
        assert!(is_image_file(Path::new("/tmp/party.jpg")));
        assert!(is_image_file(Path::new("/tmp/party.JPEG")));
        assert!(is_image_file(Path::new("/tmp/party.WebP")));
    }

    #[test]
    fn non_image_files_are_rejected() {
        assert!(!is_image_file(Path::new("/tmp/notes.txt")));
        assert!(!is_image_file(Path::new("/tmp/clip.mp4")));
        assert!(!is_image_file(Path::new("/tmp/no_extension")));
    }

    #[test]
    fn file_key_combines_name_and_size() {
        let file = PendingFile {
            path: PathBuf::from("/tmp/party.jpg"),
            name: "party.jpg".to_string(),
            size: 1234,
        };
        assert_eq!(file.file_key(), "party.jpg:1234");
    }

    #[test]
    fn from_path_rejects_non_images_without_touching_the_fs() {
        assert!(PendingFile::from_path(Path::new("/nonexistent/notes.txt")).is_none());
    }
}
