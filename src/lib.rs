//! `tonvanity`: a vanity-address miner for TON-style StateInit accounts.
//!
//! The crate is organised around the pipeline a mining session runs
//! through: a [`compiler`] turns a user pattern into a compiled
//! [`compiler::KernelConfig`], the [`kernel`] evaluates candidates against
//! it, and the [`dispatcher`] drives repeated launches and persists
//! matches. [`codec`] and [`hasher`] supply the address-encoding and
//! hashing primitives the other modules share.

pub mod base64url;
pub mod cli;
pub mod codec;
pub mod compiler;
pub mod crc16;
pub mod dispatcher;
pub mod error;
pub mod hasher;
pub mod kernel;
pub mod ownercode;
pub mod variants;

pub use error::{CoreError, CoreResult};
