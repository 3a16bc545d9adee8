//! Builds the fixed 64-byte contract-code prefix a session hashes once into
//! `CODE_STATE_BASE` (section 4.B): a tag identifying the code shape,
//! followed by the owner's public key, zero-padded out to a full SHA-256
//! block.

/// Tag bytes identifying this crate's fixed "owner-bound wallet code"
/// shape. Arbitrary but stable within a session; real StateInit code cells
/// would carry the actual compiled contract bytecode here instead.
pub const CODE_TAG: [u8; 4] = [0xff, 0x00, 0xf4, 0xa4];

/// Builds the 64-byte code-cell prefix: the tag, the 32-byte owner key, and
/// 28 zero padding bytes.
pub fn code_prefix_from_owner(owner: &[u8; 32]) -> [u8; 64] {
    let mut buf = [0u8; 64];
    buf[0..4].copy_from_slice(&CODE_TAG);
    buf[4..36].copy_from_slice(owner);
    buf
}
