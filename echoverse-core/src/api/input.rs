//! Input abstraction and text preparation

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, WINDOWS_1252};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Characters accepted per request
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Errors raised while reading or validating input
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input text is empty")]
    Empty,

    #[error("Could not decode input with any supported encoding")]
    Undecodable,

    #[error("Failed to read {source_name}: {message}")]
    Io { source_name: String, message: String },
}

/// Text source for a request
pub enum Input {
    /// Direct text input
    Text(String),
    /// File path input
    File(PathBuf),
    /// Raw bytes input, e.g. an upload
    Bytes(Vec<u8>),
    /// Reader input (boxed for object safety)
    Reader(Box<dyn Read + Send + Sync>),
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Text(text) => f
                .debug_struct("Input::Text")
                .field("length", &text.len())
                .finish(),
            Input::File(path) => f.debug_struct("Input::File").field("path", path).finish(),
            Input::Bytes(bytes) => f
                .debug_struct("Input::Bytes")
                .field("length", &bytes.len())
                .finish(),
            Input::Reader(_) => f.debug_struct("Input::Reader").finish(),
        }
    }
}

impl Input {
    pub fn from_text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Input::File(path.as_ref().to_path_buf())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }

    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Read the source and decode it to text
    pub fn into_text(self) -> Result<String, InputError> {
        match self {
            Input::Text(text) => Ok(text),
            Input::Bytes(bytes) => decode_bytes(&bytes),
            Input::File(path) => {
                let bytes = std::fs::read(&path).map_err(|e| InputError::Io {
                    source_name: path.display().to_string(),
                    message: e.to_string(),
                })?;
                decode_bytes(&bytes)
            }
            Input::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer).map_err(|e| InputError::Io {
                    source_name: "reader".to_string(),
                    message: e.to_string(),
                })?;
                decode_bytes(&buffer)
            }
        }
    }
}

/// Decode bytes trying UTF-8, UTF-16, Latin-1 and Windows-1252 in that order.
///
/// UTF-16 needs a byte order mark. Latin-1 rejects the C1 control range
/// `0x80..=0x9F`, which Windows-1252 maps to printable characters.
pub fn decode_bytes(bytes: &[u8]) -> Result<String, InputError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string());
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if encoding == UTF_16LE || encoding == UTF_16BE {
            if let Some(text) =
                encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            {
                log::debug!("Decoded input as {}", encoding.name());
                return Ok(text.into_owned());
            }
        }
    }

    if !bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        log::debug!("Decoded input as ISO-8859-1");
        return Ok(bytes.iter().map(|&b| char::from(b)).collect());
    }

    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| {
            log::debug!("Decoded input as windows-1252");
            text.into_owned()
        })
        .ok_or(InputError::Undecodable)
}

/// Text accepted for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInput {
    pub text: String,
    /// Character count before truncation
    pub original_chars: usize,
    pub truncated: bool,
}

/// Enforce the input limit.
///
/// Longer text is cut to `max_chars`, then back to the last period if that
/// lies past 80% of the limit. Blank text is rejected.
pub fn prepare_input(text: &str, max_chars: usize) -> Result<PreparedInput, InputError> {
    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let original_chars = text.chars().count();
    if original_chars <= max_chars {
        return Ok(PreparedInput {
            text: text.to_string(),
            original_chars,
            truncated: false,
        });
    }

    let head = match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    };
    let floor = max_chars * 4 / 5;
    let cut = match head.rfind('.') {
        Some(pos) if head[..pos].chars().count() > floor => &head[..=pos],
        _ => head,
    };

    log::warn!(
        "Text truncated from {} to {} characters ({} max)",
        original_chars,
        cut.chars().count(),
        max_chars
    );

    Ok(PreparedInput {
        text: cut.to_string(),
        original_chars,
        truncated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_utf8() {
        assert_eq!(decode_bytes("héllo".as_bytes()).unwrap(), "héllo");
        assert_eq!(decode_bytes(b"\xEF\xBB\xBFhi").unwrap(), "hi");
    }

    #[test]
    fn test_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Tale".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_bytes(&bytes).unwrap(), "Tale");

        let mut be = vec![0xFE, 0xFF];
        for unit in "Tale".encode_utf16() {
            be.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_bytes(&be).unwrap(), "Tale");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(decode_bytes(b"caf\xE9").unwrap(), "café");
    }

    #[test]
    fn test_windows_1252() {
        // 0x93/0x94 are curly quotes in windows-1252
        assert_eq!(decode_bytes(b"\x93hi\x94 \xE9").unwrap(), "\u{201c}hi\u{201d} é");
    }

    #[test]
    fn test_input_sources() {
        assert_eq!(Input::from_text("a").into_text().unwrap(), "a");
        assert_eq!(Input::from_bytes(b"b".to_vec()).into_text().unwrap(), "b");
        assert_eq!(
            Input::from_reader(Cursor::new(b"c".to_vec())).into_text().unwrap(),
            "c"
        );
        assert!(matches!(
            Input::from_file("/definitely/not/here.txt").into_text(),
            Err(InputError::Io { .. })
        ));
    }

    #[test]
    fn test_file_input() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"From a file.").unwrap();
        assert_eq!(Input::from_file(file.path()).into_text().unwrap(), "From a file.");
    }

    #[test]
    fn test_prepare_rejects_blank() {
        assert!(matches!(prepare_input("  \n", 100), Err(InputError::Empty)));
    }

    #[test]
    fn test_prepare_within_limit() {
        let prepared = prepare_input("Fine.", MAX_INPUT_CHARS).unwrap();
        assert!(!prepared.truncated);
        assert_eq!(prepared.text, "Fine.");
    }

    #[test]
    fn test_prepare_truncates_at_sentence() {
        let text = "x".repeat(9000) + ". " + &"y".repeat(2000);
        let prepared = prepare_input(&text, MAX_INPUT_CHARS).unwrap();
        assert!(prepared.truncated);
        assert_eq!(prepared.original_chars, 11_002);
        assert_eq!(prepared.text.chars().count(), 9001);
        assert!(prepared.text.ends_with('.'));
    }

    #[test]
    fn test_prepare_hard_cut() {
        let text = "x".repeat(100) + ". " + &"y".repeat(12_000);
        let prepared = prepare_input(&text, MAX_INPUT_CHARS).unwrap();
        assert_eq!(prepared.text.chars().count(), MAX_INPUT_CHARS);
    }
}
