//! Text compression codec for stored bundle fields
//!
//! Fields are stored compressed with zstd to keep record footprint small.
//! The transform is exactly reversible: `decode(encode(x)) == x` for any
//! text, including the empty string.

use crate::{Error, Result};

/// zstd compression level for stored fields
const LEVEL: i32 = 3;

/// Compress text into its stored byte form
pub fn encode(text: &str) -> Result<Vec<u8>> {
    Ok(zstd::encode_all(text.as_bytes(), LEVEL)?)
}

/// Decompress stored bytes back into text
pub fn decode(data: &[u8]) -> Result<String> {
    let bytes = zstd::decode_all(data)?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Corruption(format!("stored field is not valid UTF-8: {}", e)))
}
