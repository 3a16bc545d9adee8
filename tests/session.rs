//! End-to-end tests driving the public pipeline: compile a pattern, run a
//! launch, decode the resulting address, and check it against the pattern
//! that produced it.

use tonvanity::codec;
use tonvanity::compiler::{compile, MinerSpec};
use tonvanity::kernel::{run_launch, LaunchContext};
use tonvanity::ownercode::code_prefix_from_owner;

fn spec(start: &str, end: &str, case_sensitive: bool) -> MinerSpec {
    MinerSpec {
        owner: [0x61; 32],
        start: start.to_string(),
        end: end.to_string(),
        case_sensitive,
        masterchain: false,
        non_bounceable: false,
        testnet: false,
        fixed_prefix_length: 0,
    }
}

fn ctx_for(spec: &MinerSpec) -> LaunchContext {
    let config = compile(spec).unwrap();
    let code_prefix = code_prefix_from_owner(&spec.owner);
    LaunchContext::new(config, &code_prefix, tonvanity::variants::DEFAULT_D2)
}

#[test]
fn a_wide_launch_against_an_easy_pattern_finds_a_valid_match() {
    let s = spec("EQ", "", true);
    let ctx = ctx_for(&s);
    let outcome = run_launch(&ctx, [11, 22, 33, 44], 1, 4096, 16);
    assert!(!outcome.hits.is_empty(), "expected at least one match in a 4096-candidate sweep");

    let hit = &outcome.hits[0];
    assert!(hit.address.starts_with("EQ"));

    let (flags, hash) = codec::decode(&hit.address).expect("a mined address must decode cleanly");
    assert_eq!(hash, hit.hash);
    assert!(flags.bounceable);
    assert!(!flags.testnet);
    assert!(!flags.masterchain);
}

#[test]
fn case_insensitive_start_accepts_either_letter_case() {
    let s = spec("eq", "", false);
    let ctx = ctx_for(&s);
    let outcome = run_launch(&ctx, [101, 202, 303, 404], 1, 4096, 16);
    assert!(!outcome.hits.is_empty());
    for hit in &outcome.hits {
        let prefix: String = hit.address.chars().take(2).collect();
        assert!(prefix.eq_ignore_ascii_case("eq"));
    }
}

#[test]
fn combined_start_and_end_constraints_both_hold() {
    let s = spec("EQ", "A", true);
    let ctx = ctx_for(&s);
    let outcome = run_launch(&ctx, [7, 7, 7, 7], 1, 8192, 16);
    assert!(!outcome.hits.is_empty(), "expected at least one match combining start and end constraints");
    for hit in &outcome.hits {
        assert!(hit.address.starts_with("EQ"));
        assert!(hit.address.ends_with('A'));
    }
}

#[test]
fn masterchain_flag_forces_the_workchain_selector_byte() {
    let mut m = spec("", "", true);
    m.masterchain = true;
    let ctx = ctx_for(&m);
    let hit = run_launch(&ctx, [1, 1, 1, 1], 1, 4, 4).hits.into_iter().next().unwrap();
    let (flags, _) = codec::decode(&hit.address).unwrap();
    assert!(flags.masterchain);
}

#[test]
fn non_bounceable_and_testnet_flags_round_trip_through_decode() {
    let mut m = spec("", "", true);
    m.non_bounceable = true;
    m.testnet = true;
    let ctx = ctx_for(&m);
    let hit = run_launch(&ctx, [2, 2, 2, 2], 1, 4, 4).hits.into_iter().next().unwrap();
    let (flags, _) = codec::decode(&hit.address).unwrap();
    assert!(!flags.bounceable);
    assert!(flags.testnet);
}

#[test]
fn unsatisfiable_start_length_is_rejected_before_any_search_runs() {
    let s = spec(&"A".repeat(40), &"B".repeat(20), true);
    assert!(compile(&s).is_err());
}

#[test]
fn malformed_decode_input_is_rejected_with_a_specification_error() {
    assert!(codec::decode("not-a-valid-address").is_err());
    assert!(codec::decode("").is_err());
}
