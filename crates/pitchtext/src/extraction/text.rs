//! Plain text decoding with encoding detection.

/// Decoded text with simple counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub content: String,
    /// WHATWG name of the encoding used
    pub encoding: String,
    pub line_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

/// Decode text bytes.
///
/// A byte order mark decides the encoding when present; valid UTF-8 is taken as is.
/// Anything else goes through `chardetng` when the `quality` feature is enabled and is
/// decoded lossily as UTF-8 otherwise. Trailing line breaks are dropped.
pub fn decode_text_bytes(bytes: &[u8]) -> DecodedText {
    let (content, encoding) = decode(bytes);
    let content = content.trim_end_matches(['\n', '\r']).to_string();

    DecodedText {
        line_count: content.lines().count(),
        word_count: content.split_whitespace().count(),
        character_count: content.chars().count(),
        content,
        encoding,
    }
}

#[cfg(feature = "quality")]
fn decode(bytes: &[u8]) -> (String, String) {
    use chardetng::EncodingDetector;
    use encoding_rs::{Encoding, UTF_8};

    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return (decoded.into_owned(), encoding.name().to_string());
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8.name().to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    tracing::debug!("Detected text encoding {}", encoding.name());
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Text contained sequences invalid in {}", encoding.name());
    }
    (decoded.into_owned(), encoding.name().to_string())
}

#[cfg(not(feature = "quality"))]
fn decode(bytes: &[u8]) -> (String, String) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    (String::from_utf8_lossy(bytes).into_owned(), "UTF-8".to_string())
}
