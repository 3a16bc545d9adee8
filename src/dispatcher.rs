//! The Host Dispatcher (section 4.E): drives repeated launches against a
//! [`LaunchContext`], persists matches to a JSON-lines log, and honours a
//! cooperative cancellation flag checked between launches.

use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::RngCore;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::kernel::{run_launch, LaunchContext, Salt};

/// One line of the output log: a confirmed, decodable match.
#[derive(Debug, Serialize)]
pub struct MatchRecord {
    pub address: String,
    pub salt_hex: String,
    pub tick: bool,
    pub tock: bool,
    pub hash_hex: String,
}

/// Tunables for a mining session.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Candidates swept per lane, per launch (the kernel ABI's `iterations`
    /// input: a serial loop inside each parallel lane).
    pub iterations: u32,
    /// Number of parallel lanes (`g`) swept per launch.
    pub global_size: u64,
    /// Maximum hits buffered per launch before further hits are dropped
    /// and counted.
    pub capacity: usize,
    /// Upper bound on the number of launches to run (each launch advances
    /// the base salt). `None` runs until cancelled or a match is found
    /// under `stop_on_first`.
    pub max_launches: Option<u64>,
    pub stop_on_first: bool,
}

/// Drives a mining session: repeated launches, log persistence, and
/// cooperative cancellation.
pub struct Dispatcher {
    ctx: LaunchContext,
    session: SessionConfig,
    cancel: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(ctx: LaunchContext, session: SessionConfig) -> Self {
        Dispatcher {
            ctx,
            session,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clonable handle callers can use to request cancellation from
    /// another thread (e.g. a Ctrl-C handler).
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Runs the session, appending each match as one JSON line to `out`.
    /// Returns the total number of matches found and the number of
    /// launches run.
    pub fn run_session(&self, out: &Path) -> CoreResult<(u64, u64)> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(out)
            .map_err(|e| CoreError::Device(format!("cannot open match log {out:?}: {e}")))?;

        let mut rng = rand::rng();
        let mut base_salt: Salt = [0; 4];
        for w in base_salt.iter_mut() {
            *w = rng.next_u32();
        }

        let mut total_hits = 0u64;
        let mut launches = 0u64;

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!(launches, total_hits, "cancelled");
                break;
            }
            if let Some(max) = self.session.max_launches {
                if launches >= max {
                    break;
                }
            }

            let span = tracing::info_span!("launch", index = launches);
            let _enter = span.enter();

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                run_launch(
                    &self.ctx,
                    base_salt,
                    self.session.iterations,
                    self.session.global_size,
                    self.session.capacity,
                )
            }))
            .map_err(|_| CoreError::Device("search kernel panicked during launch".to_string()))?;

            if outcome.dropped > 0 {
                tracing::warn!(dropped = outcome.dropped, "launch result buffer overflowed");
            }

            for hit in &outcome.hits {
                let record = MatchRecord {
                    address: hit.address.clone(),
                    salt_hex: hex::encode(salt_to_bytes(hit.salt)),
                    tick: hit.tick,
                    tock: hit.tock,
                    hash_hex: hex::encode(hit.hash),
                };
                let line = serde_json::to_string(&record)
                    .map_err(|e| CoreError::Device(format!("failed to serialize match record: {e}")))?;
                writeln!(file, "{line}")
                    .map_err(|e| CoreError::Device(format!("failed to write match log: {e}")))?;
                total_hits += 1;
            }

            tracing::info!(hits = outcome.hits.len(), "launch complete");

            launches += 1;
            if self.session.stop_on_first && total_hits > 0 {
                break;
            }

            for w in base_salt.iter_mut() {
                *w = rng.next_u32();
            }
        }

        Ok((total_hits, launches))
    }
}

fn salt_to_bytes(salt: Salt) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (i, w) in salt.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&w.to_le_bytes());
    }
    out
}
