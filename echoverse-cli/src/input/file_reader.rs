//! File reading utilities

use anyhow::{Context, Result};
use echoverse_core::api::decode_bytes;
use std::fs;
use std::path::Path;

/// Reads text files in any encoding the library can decode
pub struct FileReader;

impl FileReader {
    /// Read a file as text, trying UTF-8, UTF-16, Latin-1 and Windows-1252
    pub fn read_text(path: &Path) -> Result<String> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

        let text = decode_bytes(&bytes)
            .with_context(|| format!("Failed to decode file: {}", path.display()))?;

        Ok(text)
    }

    /// Get file size in bytes
    pub fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;

        Ok(metadata.len())
    }

    /// File name without extension, used to name the audiobook
    pub fn stem(path: &Path) -> Option<String> {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("story.txt");

        let content = "Once upon a time.\nThe end.";
        fs::write(&file_path, content).unwrap();

        assert_eq!(FileReader::read_text(&file_path).unwrap(), content);
    }

    #[test]
    fn test_read_text_nonexistent_file() {
        let result = FileReader::read_text(Path::new("/nonexistent/story.txt"));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_read_text_windows_1252() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("legacy.txt");

        // "“Caf\u{e9}”" encoded as Windows-1252
        fs::write(&file_path, [0x93, b'C', b'a', b'f', 0xE9, 0x94]).unwrap();

        assert_eq!(FileReader::read_text(&file_path).unwrap(), "\u{201c}Café\u{201d}");
    }

    #[test]
    fn test_read_text_utf16_with_bom() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("wide.txt");

        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("Hi.".encode_utf16().flat_map(|unit| unit.to_le_bytes()));
        fs::write(&file_path, bytes).unwrap();

        assert_eq!(FileReader::read_text(&file_path).unwrap(), "Hi.");
    }

    #[test]
    fn test_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("sized.txt");

        fs::write(&file_path, "a".repeat(1024)).unwrap();

        assert_eq!(FileReader::file_size(&file_path).unwrap(), 1024);
    }

    #[test]
    fn test_stem() {
        assert_eq!(FileReader::stem(Path::new("books/chapter-1.txt")), Some("chapter-1".to_string()));
        assert_eq!(FileReader::stem(Path::new("/")), None);
    }
}
