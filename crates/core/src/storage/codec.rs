//! Base64 payload encoding and PDF signature checks.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use bytes::Bytes;

use super::error::StorageError;

/// PDF files start with this marker.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// How far into the payload the marker is searched for.
pub const SIGNATURE_WINDOW: usize = 1024;

/// Encodes bytes as standard base64.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Length of the standard base64 encoding of `len` bytes.
#[must_use]
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Decodes stored base64 text.
///
/// Accepts a `data:...;base64,` prefix, embedded whitespace and missing padding,
/// all of which show up in records written by older clients.
///
/// # Errors
///
/// Returns [`StorageError::Decode`] when the text is not base64.
pub fn decode(content: &str) -> Result<Bytes, StorageError> {
    let payload = content
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .map_or(content, |(_, data)| data);

    let cleaned: String;
    let payload = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        cleaned = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        cleaned.as_str()
    } else {
        payload
    };

    STANDARD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map(Bytes::from)
        .map_err(StorageError::from)
}

/// Result of looking for the PDF marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfSignature {
    /// Marker at offset zero.
    Valid,
    /// Marker found after some leading junk.
    Offset(usize),
    /// No marker in the first [`SIGNATURE_WINDOW`] bytes.
    Missing,
}

impl PdfSignature {
    /// Inspects the start of `bytes`.
    #[must_use]
    pub fn inspect(bytes: &[u8]) -> Self {
        let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
        match window
            .windows(PDF_MAGIC.len())
            .position(|w| w == PDF_MAGIC)
        {
            Some(0) => Self::Valid,
            Some(offset) => Self::Offset(offset),
            None => Self::Missing,
        }
    }

    /// True when the marker is at offset zero.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_matches_encoder() {
        for len in [0, 1, 2, 3, 4, 5, 1000, 2 * 1024 * 1024] {
            assert_eq!(encoded_len(len), encode(&vec![7u8; len]).len());
        }
    }

    #[test]
    fn test_decode_accepts_data_url() {
        let encoded = format!("data:application/pdf;base64,{}", encode(b"%PDF-1.4"));
        assert_eq!(decode(&encoded).expect("decode").as_ref(), b"%PDF-1.4");
    }

    #[test]
    fn test_decode_accepts_whitespace_and_missing_padding() {
        assert_eq!(decode("JVBE\nRi0x").expect("decode").as_ref(), b"%PDF-1");
        assert_eq!(decode("JVBERg").expect("decode").as_ref(), b"%PDF");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not base64!!"), Err(StorageError::Decode(_))));
    }

    #[test]
    fn test_signature() {
        assert_eq!(PdfSignature::inspect(b"%PDF-1.7\n..."), PdfSignature::Valid);
        assert_eq!(
            PdfSignature::inspect(b"\xef\xbb\xbf%PDF-1.4"),
            PdfSignature::Offset(3)
        );
        assert_eq!(PdfSignature::inspect(b"<html>"), PdfSignature::Missing);
        assert_eq!(PdfSignature::inspect(b""), PdfSignature::Missing);

        let mut late = vec![b' '; SIGNATURE_WINDOW];
        late.extend_from_slice(PDF_MAGIC);
        assert_eq!(PdfSignature::inspect(&late), PdfSignature::Missing);
    }
}
