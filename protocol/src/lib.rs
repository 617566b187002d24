// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # BTM Offline — Core Library
//!
//! Builds, prices and signs transactions for a Bytom-style UTXO ledger
//! without talking to a node. Give it the outputs you are spending, the
//! outputs you want, a change program and your keys; get back the
//! transaction id and hex bytes ready to submit.
//!
//! ## Architecture
//!
//! - **encoding** — Canonical varint/varstr encoding shared by ids and wire bytes.
//! - **entry** — Content-addressed entries (spend, issuance, mux, output,
//!   retirement, header) and the arena that holds one transaction's graph.
//! - **transaction** — The build pipeline: validation, fee estimation, graph
//!   mapping, signing and serialization, plus raw decoding.
//! - **crypto** — SHA3-256, RIPEMD-160 and Ed25519 wrappers.
//! - **config** — Consensus constants and the tunable [`config::FeeSchedule`].
//!
//! ## Ground Rules
//!
//! 1. Ids depend on content and explicit ordinals only. Same inputs, same bytes.
//! 2. A transaction is returned fully signed or not at all.
//! 3. No I/O and no global state: builds are independent and may run in parallel.
//! 4. Amounts are `u64` base units, summed with checked arithmetic.

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod entry;
pub mod transaction;
