//! The Address Codec (section 4.A): the 36-byte friendly-address
//! representation, its base64url rendering, and the CRC16 checksum that
//! guards it. Mirrors the tag/flags scheme and CRC handling of TON
//! friendly-address encoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::base64url::{validate_alphabet, ADDRESS_CHARS, REPR_BYTES};
use crate::crc16;
use crate::error::CoreError;

/// Byte index of the flags/tag byte.
pub const FLAGS_HI_INDEX: usize = 0;
/// Byte index of the workchain-selector byte.
pub const FLAGS_LO_INDEX: usize = 1;
/// Byte index at which the 32-byte account hash begins.
pub const HASH_INDEX: usize = 2;
/// Byte index at which the trailing CRC16 begins.
pub const CRC_INDEX: usize = 34;

/// The flags and workchain selection that, together with an account hash,
/// make up a full friendly address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFlags {
    pub bounceable: bool,
    pub testnet: bool,
    pub masterchain: bool,
}

impl AddressFlags {
    /// `FLAGS_HI = 0x11 | (0x40 if non-bounceable) | (0x80 if testnet)`.
    pub fn flags_hi(self) -> u8 {
        0x11 | (if self.bounceable { 0x00 } else { 0x40 }) | (if self.testnet { 0x80 } else { 0x00 })
    }

    /// `FLAGS_LO = 0xff` for the masterchain (workchain -1), `0x00` for the
    /// base workchain.
    pub fn flags_lo(self) -> u8 {
        if self.masterchain {
            0xff
        } else {
            0x00
        }
    }

    fn from_bytes(hi: u8, lo: u8) -> Result<Self, CoreError> {
        if hi & 0x11 != 0x11 {
            return Err(CoreError::Specification(format!(
                "flags byte {hi:#04x} does not carry the required 0x11 tag bits"
            )));
        }
        let bounceable = hi & 0x40 == 0;
        let testnet = hi & 0x80 != 0;
        let masterchain = match lo {
            0x00 => false,
            0xff => true,
            other => {
                return Err(CoreError::Specification(format!(
                    "workchain-selector byte {other:#04x} is neither 0x00 nor 0xff"
                )))
            }
        };
        Ok(AddressFlags {
            bounceable,
            testnet,
            masterchain,
        })
    }
}

/// Builds the 36-byte representation for an account hash under the given
/// flags, including the trailing CRC16.
pub fn build_repr(flags: AddressFlags, hash: &[u8; 32]) -> [u8; REPR_BYTES] {
    let mut repr = [0u8; REPR_BYTES];
    repr[FLAGS_HI_INDEX] = flags.flags_hi();
    repr[FLAGS_LO_INDEX] = flags.flags_lo();
    repr[HASH_INDEX..HASH_INDEX + 32].copy_from_slice(hash);

    let table = crc16::build_table();
    let crc = crc16::crc16(&repr[..crc16::CRC_INPUT_LEN], &table);
    repr[CRC_INDEX..CRC_INDEX + 2].copy_from_slice(&crc.to_be_bytes());
    repr
}

/// Renders a full 36-byte representation as a 48-character base64url
/// address.
pub fn encode_repr(repr: &[u8; REPR_BYTES]) -> String {
    URL_SAFE_NO_PAD.encode(repr)
}

/// Convenience: builds and renders an address in one step.
pub fn encode(flags: AddressFlags, hash: &[u8; 32]) -> String {
    encode_repr(&build_repr(flags, hash))
}

/// Host-side decode of a friendly address: validates its alphabet, length,
/// and CRC, and recovers its flags and account hash.
pub fn decode(address: &str) -> Result<(AddressFlags, [u8; 32]), CoreError> {
    if address.chars().count() != ADDRESS_CHARS {
        return Err(CoreError::Specification(format!(
            "address has {} characters, expected {ADDRESS_CHARS}",
            address.chars().count()
        )));
    }
    validate_alphabet(address, "address")?;

    let repr = URL_SAFE_NO_PAD
        .decode(address)
        .map_err(|e| CoreError::Specification(format!("address is not valid base64url: {e}")))?;
    if repr.len() != REPR_BYTES {
        return Err(CoreError::Specification(format!(
            "decoded address has {} bytes, expected {REPR_BYTES}",
            repr.len()
        )));
    }

    let table = crc16::build_table();
    let expect_crc = crc16::crc16(&repr[..crc16::CRC_INPUT_LEN], &table);
    let got_crc = u16::from_be_bytes([repr[CRC_INDEX], repr[CRC_INDEX + 1]]);
    if expect_crc != got_crc {
        return Err(CoreError::Specification(format!(
            "address CRC mismatch: expected {expect_crc:#06x}, found {got_crc:#06x}"
        )));
    }

    let flags = AddressFlags::from_bytes(repr[FLAGS_HI_INDEX], repr[FLAGS_LO_INDEX])?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&repr[HASH_INDEX..HASH_INDEX + 32]);
    Ok((flags, hash))
}
