//! The Search Kernel (section 4.D): per-candidate evaluation, and the
//! `rayon`-driven launch loop that sweeps a batch of salts across it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::base64url::extract_digit;
use crate::codec::build_repr;
use crate::compiler::{rewrite_hash0, CaseChar, KernelConfig};
use crate::crc16;
use crate::hasher::{self, code_cell_block, code_state_base, main_hash};
use crate::variants::{build_variants, Variant};

/// A 128-bit salt, represented as four 32-bit host words (little-endian
/// limb order, matching how it is drawn from the RNG).
pub type Salt = [u32; 4];

/// A confirmed match: the salt and variant that produced it, and the
/// rendered address.
#[derive(Debug, Clone)]
pub struct Hit {
    pub salt: Salt,
    pub tick: bool,
    pub tock: bool,
    pub address: String,
    pub hash: [u8; 32],
}

/// Everything the kernel needs that does not change within a launch:
/// compiled constraints, the owner-derived code-cell midstate, and the four
/// precomputed StateInit variants.
#[derive(Clone)]
pub struct LaunchContext {
    pub config: KernelConfig,
    pub code_state_base: [u32; 8],
    pub variants: [Variant; 4],
}

impl LaunchContext {
    pub fn new(config: KernelConfig, code_prefix: &[u8; 64], d2: u8) -> Self {
        let code_state_base = code_state_base(code_prefix);
        let variants = build_variants(d2);
        LaunchContext {
            config,
            code_state_base,
            variants,
        }
    }
}

fn case_chars_match(repr: &[u8; 36], chars: &[CaseChar]) -> bool {
    chars.iter().all(|cc| {
        let got = extract_digit(repr, cc.bit_offset);
        got == cc.alt0 || got == cc.alt1
    })
}

/// Evaluates one `(salt, variant)` pair against the compiled configuration.
/// Returns every rewritten-`hash0` candidate that passes -- usually zero or
/// one, but the CRC-delta sweep (Stage 3B) can legitimately pass more than
/// one admissible `hash0` for the same `(salt, variant)`, and section 4.D's
/// orderings note says all of them are emitted.
///
/// Mirrors the staged structure of the design doc's section 4.D:
/// - Stage 1 checks the CRC- and `hash0`-independent byte filters (`repr[3..33]`).
/// - Stage 2 checks the case-insensitive positions entirely inside the hash body.
/// - Stage 3A (`NEED_CRC == 0`) rewrites `hash0` once via the canonical
///   `FREE_HASH_VAL` and emits at most one hit, without ever touching the CRC
///   bytes for the pass/fail decision.
/// - Stage 3B (`NEED_CRC == 1`) sweeps every admissible `hash0` in
///   `HASH0_VALUES`, recomputing the CRC for each via the delta table
///   instead of a full 34-byte recomputation.
pub fn search_candidate(ctx: &LaunchContext, salt: Salt, variant: &Variant) -> Vec<Hit> {
    let code_block = code_cell_block(salt);
    let mut code_state = ctx.code_state_base;
    hasher::compress(&mut code_state, &code_block);

    let main_state = main_hash(&variant.prefix_w, &code_state, variant.l);
    let hash = hasher::state_to_bytes(&main_state);

    let config = &ctx.config;

    // Stage 1: CRC- and hash0-independent byte filters (repr[3..33]).
    for i in 1..32 {
        let m = config.mask[2 + i];
        if m != 0 && (hash[i] & m) != config.val[2 + i] {
            return Vec::new();
        }
    }

    // Stage 2: case-insensitive positions entirely inside the hash body.
    let mut body = [0u8; 36];
    body[0] = config.flags.flags_hi();
    body[1] = config.flags.flags_lo();
    body[2..34].copy_from_slice(&hash);
    if !case_chars_match(&body, &config.case_const) {
        return Vec::new();
    }

    if config.free_hash_mask == 0 {
        return search_candidate_no_free_window(config, salt, variant, &hash, &body);
    }
    search_candidate_free_window(config, salt, variant, &hash, &body)
}

/// `fixed_prefix_length == 0`: there is no free-bit window, so `hash0` is
/// exactly the raw hash byte (the rewrite formula with `mask == 0` is the
/// identity). A single candidate, so Stage 3A/3B differ only in whether the
/// CRC bytes are worth checking at all.
fn search_candidate_no_free_window(
    config: &KernelConfig,
    salt: Salt,
    variant: &Variant,
    hash: &[u8; 32],
    body: &[u8; 36],
) -> Vec<Hit> {
    let hash0 = rewrite_hash0(hash[0], config.free_hash_mask, config.free_hash_val);
    if config.mask[2] != 0 && (hash0 & config.mask[2]) != config.val[2] {
        return Vec::new();
    }

    let mut h = *hash;
    h[0] = hash0;

    if !config.need_crc {
        let mut probe = *body;
        probe[2] = hash0;
        if !case_chars_match(&probe, &config.case_var) {
            return Vec::new();
        }
        let repr = build_repr(config.flags, &h);
        return vec![hit_from_repr(salt, variant, &repr, h)];
    }

    let repr = build_repr(config.flags, &h);
    if config.mask[34] != 0 && (repr[34] & config.mask[34]) != config.val[34] {
        return Vec::new();
    }
    if config.mask[35] != 0 && (repr[35] & config.mask[35]) != config.val[35] {
        return Vec::new();
    }
    if !case_chars_match(&repr, &config.case_var) {
        return Vec::new();
    }
    vec![hit_from_repr(salt, variant, &repr, h)]
}

/// `fixed_prefix_length == 8`: `hash0` may be rewritten to any byte
/// consistent with the pattern, enumerated ahead of time in `hash0_values`.
fn search_candidate_free_window(
    config: &KernelConfig,
    salt: Salt,
    variant: &Variant,
    hash: &[u8; 32],
    body: &[u8; 36],
) -> Vec<Hit> {
    if !config.need_crc {
        // Stage 3A: the legacy fast path. A single canonical hash0, no CRC
        // computed for the pass/fail decision.
        let hash0 = rewrite_hash0(hash[0], config.free_hash_mask, config.free_hash_val);
        let mut probe = *body;
        probe[2] = hash0;
        if !case_chars_match(&probe, &config.case_var) {
            return Vec::new();
        }
        let mut h = *hash;
        h[0] = hash0;
        let repr = build_repr(config.flags, &h);
        return vec![hit_from_repr(salt, variant, &repr, h)];
    }

    // Stage 3B: sweep every admissible hash0, recomputing the CRC via the
    // delta table instead of a full 34-byte recomputation per candidate.
    let mut zeroed = *body;
    zeroed[2] = 0;
    let crc_base = crc16::crc16(&zeroed[..crc16::CRC_INPUT_LEN], &config.crc_table);

    let mut hits = Vec::new();
    for &b in &config.hash0_values {
        let hash0 = rewrite_hash0(hash[0], config.free_hash_mask, b);
        let crc = crc16::replace_byte2(crc_base, hash0, &config.crc_delta_pos2);
        let crc_hi = (crc >> 8) as u8;
        let crc_lo = crc as u8;
        if config.mask[34] != 0 && (crc_hi & config.mask[34]) != config.val[34] {
            continue;
        }
        if config.mask[35] != 0 && (crc_lo & config.mask[35]) != config.val[35] {
            continue;
        }

        let mut probe = *body;
        probe[2] = hash0;
        probe[34] = crc_hi;
        probe[35] = crc_lo;
        if !case_chars_match(&probe, &config.case_var) {
            continue;
        }

        let mut h = *hash;
        h[0] = hash0;
        hits.push(hit_from_repr(salt, variant, &probe, h));
    }
    hits
}

fn hit_from_repr(salt: Salt, variant: &Variant, repr: &[u8; 36], hash: [u8; 32]) -> Hit {
    Hit {
        salt,
        tick: variant.tick_tock.tick,
        tock: variant.tick_tock.tock,
        address: crate::codec::encode_repr(repr),
        hash,
    }
}

/// The outcome of one launch: the hits found, and whether any were dropped
/// because the bounded results buffer was already full.
#[derive(Debug, Default)]
pub struct LaunchOutcome {
    pub hits: Vec<Hit>,
    pub dropped: u64,
}

/// Sweeps `iterations * global_size` salts across all four StateInit
/// variants, via `rayon`. The effective salt for work item `(t, g)` is
/// `(base_salt[0] XOR t, base_salt[1] XOR g, base_salt[2], base_salt[3])`
/// (section 3): `g` is the parallel lane, driven by `rayon`'s
/// `into_par_iter()`; `t` is the per-lane iteration, a plain serial loop
/// inside each lane, matching the kernel ABI's `iterations` input (section
/// 6) -- the device-side equivalent of batching several candidates per
/// thread to amortize launch overhead. Hits are folded into a
/// capacity-bounded buffer; once full, further hits are counted in
/// `dropped` rather than stored, mirroring a fixed-size device result slab.
pub fn run_launch(ctx: &LaunchContext, base_salt: Salt, iterations: u32, global_size: u64, capacity: usize) -> LaunchOutcome {
    let hits = Mutex::new(Vec::with_capacity(capacity.min(64)));
    let dropped = AtomicU64::new(0);

    (0..global_size).into_par_iter().for_each(|g| {
        let g = g as u32;
        for t in 0..iterations {
            let salt: Salt = [base_salt[0] ^ t, base_salt[1] ^ g, base_salt[2], base_salt[3]];

            for variant in &ctx.variants {
                for hit in search_candidate(ctx, salt, variant) {
                    let mut guard = hits.lock().expect("hits mutex poisoned");
                    if guard.len() < capacity {
                        guard.push(hit);
                    } else {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
    });

    LaunchOutcome {
        hits: hits.into_inner().expect("hits mutex poisoned"),
        dropped: dropped.load(Ordering::Relaxed),
    }
}
