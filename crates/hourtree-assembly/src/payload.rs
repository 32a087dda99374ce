//! Leaf payload framing
//!
//! One leaf file per (region, bucket): a record count followed by
//! length-prefixed record payloads, all little-endian u32. Deterministic
//! for the same records in the same store order. The domain encoding of
//! the payload bytes themselves happens upstream of this crate.

use hourtree_core::Record;

pub fn encode_payload(records: &[Record]) -> Vec<u8> {
    let body_len: usize = records.iter().map(|r| 4 + r.payload().len()).sum();
    let mut out = Vec::with_capacity(4 + body_len);
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        out.extend_from_slice(&(record.payload().len() as u32).to_le_bytes());
        out.extend_from_slice(record.payload());
    }
    out
}
