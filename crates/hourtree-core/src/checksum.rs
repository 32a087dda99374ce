//! Index checksums
//!
//! Blake3 digest over an index file's bytes, published hex-encoded as the
//! sibling `index.checksum` file. A corruption detector for downstream
//! mirrors, not a security primitive. The digest covers only the owning
//! directory's index bytes; there is no aggregation up the tree.

/// Fixed-size verification token over a byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    bytes: [u8; 32],
}

impl Checksum {
    pub fn of(bytes: &[u8]) -> Self {
        Self {
            bytes: *blake3::hash(bytes).as_bytes(),
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let a = Checksum::of(b"DE\nFR\n");
        let b = Checksum::of(b"DE\nFR\n");
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn checksum_detects_content_changes() {
        assert_ne!(Checksum::of(b"DE\n"), Checksum::of(b"DE\nFR\n"));
    }

    #[test]
    fn hex_token_is_64_chars() {
        assert_eq!(Checksum::of(b"").to_hex().len(), 64);
    }
}
