//! Command-line surface (section 6): a `Mine` command that compiles a
//! pattern and runs a session, and a `Decode` command for inspecting an
//! existing address.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tonvanity", about = "Vanity TON StateInit address miner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for a StateInit whose rendered address matches a pattern.
    Mine {
        /// Owner public key, hex-encoded (32 bytes).
        #[arg(long)]
        owner: String,

        /// Required literal prefix of the rendered address.
        #[arg(long, default_value = "")]
        start: String,

        /// Required literal suffix of the rendered address.
        #[arg(long, default_value = "")]
        end: String,

        /// Match letter case exactly, instead of allowing either case.
        #[arg(long)]
        case_sensitive: bool,

        /// Target the masterchain (workchain -1) instead of the base
        /// workchain.
        #[arg(long)]
        masterchain: bool,

        /// Render a non-bounceable address.
        #[arg(long)]
        non_bounceable: bool,

        /// Render a testnet address.
        #[arg(long)]
        testnet: bool,

        /// Number of high bits of the account hash's first byte to pin via
        /// a widened StateInit header. 0 or 8.
        #[arg(long, default_value_t = 0)]
        fixed_prefix_length: u8,

        /// Candidates swept per lane, per launch (a serial loop inside each
        /// parallel lane).
        #[arg(long, default_value_t = 64)]
        iterations: u64,

        /// Number of parallel lanes swept per launch.
        #[arg(long, default_value_t = 1 << 16)]
        workers: u64,

        /// Maximum number of launches to run before giving up.
        #[arg(long)]
        max_launches: Option<u64>,

        /// Stop as soon as one match is found.
        #[arg(long)]
        stop_on_first: bool,

        /// Path to the JSON-lines match log.
        #[arg(long, default_value = "matches.jsonl")]
        out: PathBuf,
    },

    /// Decode a friendly address into its flags and account hash.
    Decode {
        /// The 48-character base64url address.
        address: String,
    },
}
