use anyhow::{bail, Context, Result};
use clap::Parser;
use tonvanity::cli::{Cli, Command};
use tonvanity::codec;
use tonvanity::compiler::{compile, MinerSpec};
use tonvanity::dispatcher::{Dispatcher, SessionConfig};
use tonvanity::kernel::LaunchContext;
use tonvanity::ownercode::code_prefix_from_owner;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Mine {
            owner,
            start,
            end,
            case_sensitive,
            masterchain,
            non_bounceable,
            testnet,
            fixed_prefix_length,
            iterations,
            workers,
            max_launches,
            stop_on_first,
            out,
        } => run_mine(
            owner,
            start,
            end,
            case_sensitive,
            masterchain,
            non_bounceable,
            testnet,
            fixed_prefix_length,
            iterations,
            workers,
            max_launches,
            stop_on_first,
            out,
        ),
        Command::Decode { address } => run_decode(&address),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_mine(
    owner: String,
    start: String,
    end: String,
    case_sensitive: bool,
    masterchain: bool,
    non_bounceable: bool,
    testnet: bool,
    fixed_prefix_length: u8,
    iterations: u64,
    workers: u64,
    max_launches: Option<u64>,
    stop_on_first: bool,
    out: std::path::PathBuf,
) -> Result<()> {
    let owner_bytes = hex::decode(&owner).context("owner is not valid hex")?;
    if owner_bytes.len() != 32 {
        bail!("owner must decode to 32 bytes, got {}", owner_bytes.len());
    }
    let mut owner_key = [0u8; 32];
    owner_key.copy_from_slice(&owner_bytes);

    let spec = MinerSpec {
        owner: owner_key,
        start,
        end,
        case_sensitive,
        masterchain,
        non_bounceable,
        testnet,
        fixed_prefix_length,
    };
    let config = compile(&spec).context("invalid search specification")?;

    let code_prefix = code_prefix_from_owner(&spec.owner);
    let ctx = LaunchContext::new(config, &code_prefix, tonvanity::variants::DEFAULT_D2);

    let session = SessionConfig {
        iterations: u32::try_from(iterations).context("iterations must fit in 32 bits")?,
        global_size: workers,
        capacity: 1024,
        max_launches,
        stop_on_first,
    };
    let dispatcher = Dispatcher::new(ctx, session);

    let (hits, launches) = dispatcher.run_session(&out)?;
    tracing::info!(hits, launches, out = %out.display(), "session finished");
    println!("found {hits} match(es) across {launches} launch(es); see {}", out.display());
    Ok(())
}

fn run_decode(address: &str) -> Result<()> {
    let (flags, hash) = codec::decode(address)?;
    println!("bounceable:  {}", flags.bounceable);
    println!("testnet:     {}", flags.testnet);
    println!("masterchain: {}", flags.masterchain);
    println!("hash:        {}", hex::encode(hash));
    Ok(())
}
