//! The Constraint Compiler (section 4.C): turns a [`MinerSpec`] into a
//! [`KernelConfig`] the search kernel can evaluate per candidate without
//! ever re-touching strings or doing per-character work in the hot loop.

use crate::base64url::{
    bytes_touched, case_alternatives, char_bit_offset, char_to_digit, is_alpha, merge_digit,
    validate_alphabet, ADDRESS_CHARS, REPR_BYTES,
};
use crate::codec::AddressFlags;
use crate::crc16;
use crate::error::CoreError;

/// The user-facing search specification: everything needed to compile a
/// [`KernelConfig`], before any bit-packing has happened.
#[derive(Debug, Clone)]
pub struct MinerSpec {
    /// 32-byte owner public key the contract code is bound to.
    pub owner: [u8; 32],
    /// Required literal prefix of the rendered address (may be empty).
    pub start: String,
    /// Required literal suffix of the rendered address (may be empty).
    pub end: String,
    /// When false, alphabetic characters in `start`/`end` match either case.
    pub case_sensitive: bool,
    pub masterchain: bool,
    pub non_bounceable: bool,
    pub testnet: bool,
    /// TON's `fixed_prefix_length`: the number of high bits of the account
    /// hash's first byte (`hash0`) that are free for the miner to rewrite
    /// after hashing. This crate accepts only `0` (no free bits) or `8`
    /// (the whole byte free).
    pub fixed_prefix_length: u8,
}

/// A single case-insensitive character's compiled position: the absolute
/// bit offset of its 6-bit digit window, and the two digit values ("this
/// letter" in each case) that satisfy it.
#[derive(Debug, Clone, Copy)]
pub struct CaseChar {
    pub bit_offset: usize,
    pub alt0: u8,
    pub alt1: u8,
}

/// The compiled form of a [`MinerSpec`]: exact bitmask/value constraints
/// over the 36-byte representation, plus the handful of case-insensitive
/// positions that need an OR-of-two-digits check instead.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub mask: [u8; REPR_BYTES],
    pub val: [u8; REPR_BYTES],
    /// Case-insensitive positions entirely inside the hash body (bytes
    /// 3..33): checkable before the CRC is ever computed.
    pub case_const: Vec<CaseChar>,
    /// Case-insensitive positions touching `hash0` (byte 2) or the CRC
    /// (bytes 34, 35): checkable only once the CRC is known.
    pub case_var: Vec<CaseChar>,
    /// Whether the CRC bytes (or a case-insensitive position touching
    /// `hash0` or the CRC) are constrained, and therefore whether the
    /// kernel must compute the CRC at all to evaluate a candidate.
    pub need_crc: bool,
    /// `FREE_HASH_MASK`: the bits of `hash0` the free-bit rewrite window
    /// permits overwriting. Zero when `fixed_prefix_length == 0`; `0xff`
    /// when it is `8` (the only other value this crate accepts).
    pub free_hash_mask: u8,
    /// `FREE_HASH_VAL`: the canonical rewritten value used by the
    /// CRC-independent fast path; when the slow path sweeps `hash0_values`,
    /// each swept candidate supplies its own value instead.
    pub free_hash_val: u8,
    /// `HASH0_VALUES`: every byte consistent with `mask[2]`/`val[2]`
    /// (`mask[2] & b == val[2]`), enumerated once at compile time so the
    /// kernel can sweep them against the CRC-delta table. Empty when
    /// `fixed_prefix_length == 0` (no free-bit window to sweep).
    pub hash0_values: Vec<u8>,
    /// `HASH0_COUNT`: `hash0_values.len()`, cached alongside it.
    pub hash0_count: usize,
    pub fixed_prefix_length: u8,
    pub flags: AddressFlags,
    /// `CRC16_TABLE`: the CRC16-CCITT table, precomputed once per session.
    pub crc_table: [u16; 256],
    /// `CRC16_DELTA_POS2`: precomputed against `crc_table`, letting the
    /// kernel sweep `hash0_values` at O(1) per candidate.
    pub crc_delta_pos2: [u16; 256],
}

/// The free-bit rewrite formula (`SPEC_FULL.md` section 3): substitutes the
/// bits of `val` selected by `mask` into `h0`, leaving the rest of the raw
/// hash byte untouched. With `mask == 0` this is the identity; with
/// `mask == 0xff` it discards `h0` entirely and returns `val`.
pub fn rewrite_hash0(h0: u8, mask: u8, val: u8) -> u8 {
    (h0 & !mask) | (val & mask)
}

/// Merges one literal pattern character (from `start` or `end`) at absolute
/// character position `pos` into the in-progress mask/val arrays, or, if it
/// is alphabetic and the search is case-insensitive, appends it to
/// `case_chars` instead.
fn apply_char(
    pos: usize,
    c: u8,
    case_sensitive: bool,
    mask: &mut [u8; REPR_BYTES],
    val: &mut [u8; REPR_BYTES],
    case_chars: &mut Vec<CaseChar>,
) -> Result<(), CoreError> {
    let offset = char_bit_offset(pos);
    if !case_sensitive && is_alpha(c) {
        let (alt0, alt1) = case_alternatives(c);
        case_chars.push(CaseChar {
            bit_offset: offset,
            alt0,
            alt1,
        });
        Ok(())
    } else {
        let digit = char_to_digit(c).expect("alphabet already validated");
        merge_digit(mask, val, offset, digit)
    }
}

/// Compiles a [`MinerSpec`] into a [`KernelConfig`], validating the
/// specification-error surface: alphabet membership, start/end length
/// against the 48-character window, internal bit conflicts, and
/// `fixed_prefix_length` consistency.
pub fn compile(spec: &MinerSpec) -> Result<KernelConfig, CoreError> {
    validate_alphabet(&spec.start, "start")?;
    validate_alphabet(&spec.end, "end")?;

    let start_len = spec.start.chars().count();
    let end_len = spec.end.chars().count();
    if start_len + end_len > ADDRESS_CHARS {
        return Err(CoreError::Specification(format!(
            "start ({start_len} chars) and end ({end_len} chars) together exceed the {ADDRESS_CHARS}-character address"
        )));
    }

    let flags = AddressFlags {
        bounceable: !spec.non_bounceable,
        testnet: spec.testnet,
        masterchain: spec.masterchain,
    };

    let mut mask = [0u8; REPR_BYTES];
    let mut val = [0u8; REPR_BYTES];
    mask[0] = 0xff;
    val[0] = flags.flags_hi();
    mask[1] = 0xff;
    val[1] = flags.flags_lo();

    let mut case_chars = Vec::new();
    for (i, c) in spec.start.bytes().enumerate() {
        apply_char(i, c, spec.case_sensitive, &mut mask, &mut val, &mut case_chars)?;
    }
    let end_start_pos = ADDRESS_CHARS - end_len;
    for (i, c) in spec.end.bytes().enumerate() {
        apply_char(end_start_pos + i, c, spec.case_sensitive, &mut mask, &mut val, &mut case_chars)?;
    }

    let mut case_const = Vec::new();
    let mut case_var = Vec::new();
    for cc in case_chars {
        let (lo, hi) = bytes_touched(cc.bit_offset);
        let touches_var_region = (lo..=hi).any(|b| b == 2 || b == 34 || b == 35);
        if touches_var_region {
            case_var.push(cc);
        } else {
            case_const.push(cc);
        }
    }

    // Every case-insensitive position touching hash0 or the CRC forces the
    // kernel to evaluate it per CRC candidate rather than once up front, so
    // its presence alone -- regardless of which of the two bytes it touches
    // -- is enough to require the CRC (resolves the fast-path open question
    // against silently missing a case match).
    let need_crc = mask[34] != 0 || mask[35] != 0 || !case_var.is_empty();

    if spec.fixed_prefix_length != 0 && spec.fixed_prefix_length != 8 {
        return Err(CoreError::Specification(
            "fixed_prefix_length must be 0 or 8".into(),
        ));
    }

    let (free_hash_mask, free_hash_val, hash0_values) = if spec.fixed_prefix_length == 0 {
        (0u8, 0u8, Vec::new())
    } else {
        let mask2 = mask[2];
        let val2 = val[2];
        let values: Vec<u8> = (0u16..=255)
            .map(|b| b as u8)
            .filter(|&b| (b & mask2) == val2)
            .collect();
        if values.is_empty() {
            return Err(CoreError::Specification(
                "no value of hash0 satisfies both the free-bit rewrite and the start/end pattern".into(),
            ));
        }
        let canonical = values[0];
        (0xffu8, canonical, values)
    };
    let hash0_count = hash0_values.len();

    let crc_table = crc16::build_table();
    let crc_delta_pos2 = crc16::build_delta_pos2(&crc_table);

    Ok(KernelConfig {
        mask,
        val,
        case_const,
        case_var,
        need_crc,
        free_hash_mask,
        free_hash_val,
        hash0_values,
        hash0_count,
        fixed_prefix_length: spec.fixed_prefix_length,
        flags,
        crc_table,
        crc_delta_pos2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec() -> MinerSpec {
        MinerSpec {
            owner: [0x42; 32],
            start: String::new(),
            end: String::new(),
            case_sensitive: true,
            masterchain: false,
            non_bounceable: false,
            testnet: false,
            fixed_prefix_length: 0,
        }
    }

    #[test]
    fn empty_pattern_compiles_with_only_flags_pinned() {
        let spec = base_spec();
        let cfg = compile(&spec).unwrap();
        assert_eq!(cfg.mask[0], 0xff);
        assert_eq!(cfg.mask[1], 0xff);
        assert!(cfg.mask[2..].iter().all(|&m| m == 0));
    }

    #[test]
    fn case_sensitive_start_merges_directly_into_mask() {
        let mut spec = base_spec();
        spec.start = "EQ".to_string(); // consistent with the default bounceable-mainnet flags
        let cfg = compile(&spec).unwrap();
        assert!(cfg.case_const.is_empty() && cfg.case_var.is_empty());
        assert_eq!(cfg.val[0], cfg.flags.flags_hi());
        assert_eq!(cfg.val[1], cfg.flags.flags_lo());
    }

    #[test]
    fn inconsistent_start_conflicts_with_chosen_flags() {
        let mut spec = base_spec();
        spec.start = "zz".to_string(); // not consistent with bounceable-mainnet flags
        assert!(compile(&spec).is_err());
    }

    #[test]
    fn case_insensitive_alphabetic_start_becomes_case_constraints() {
        let mut spec = base_spec();
        spec.start = "Ab".to_string();
        spec.case_sensitive = false;
        let cfg = compile(&spec).unwrap();
        assert_eq!(cfg.case_const.len() + cfg.case_var.len(), 2);
    }

    #[test]
    fn start_and_end_overflowing_address_length_is_rejected() {
        let mut spec = base_spec();
        spec.start = "A".repeat(30);
        spec.end = "B".repeat(30);
        assert!(compile(&spec).is_err());
    }

    #[test]
    fn conflicting_start_characters_are_rejected() {
        // Two characters whose 6-bit windows share a byte with incompatible
        // bit patterns: construct by forcing the same position twice via a
        // pathological one-character overlap test at the representation
        // level instead, since start/end never overlap by construction.
        let mut spec = base_spec();
        spec.start = "\u{2603}".to_string(); // not in the alphabet
        assert!(compile(&spec).is_err());
    }

    #[test]
    fn fixed_prefix_length_other_than_0_or_8_is_rejected() {
        let mut spec = base_spec();
        spec.fixed_prefix_length = 4;
        assert!(compile(&spec).is_err());
    }

    #[test]
    fn fixed_prefix_length_eight_with_no_byte2_constraint_enumerates_every_value() {
        let mut spec = base_spec();
        spec.fixed_prefix_length = 8;
        let cfg = compile(&spec).unwrap();
        assert_eq!(cfg.free_hash_mask, 0xff);
        assert_eq!(cfg.hash0_count, 256);
    }

    #[test]
    fn fixed_prefix_length_eight_enumerates_only_values_the_pattern_allows() {
        let mut spec = base_spec();
        spec.start = "EQAA".to_string(); // four characters fully pin byte 2
        spec.fixed_prefix_length = 8;
        let cfg = compile(&spec).unwrap();
        assert_eq!(cfg.mask[2], 0xff);
        assert_eq!(cfg.hash0_values, vec![cfg.val[2]]);
        assert_eq!(cfg.hash0_count, 1);
        assert_eq!(cfg.free_hash_val, cfg.val[2]);
    }
}
