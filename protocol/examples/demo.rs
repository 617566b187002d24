//! Walkthrough of an offline build: keys, a payment with change, a
//! dust-sized remainder, an asset issuance, and decoding the result.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use btm_offline::config::{FeeSchedule, FEE_ASSET_ID};
use btm_offline::crypto::hash::Hash;
use btm_offline::crypto::keys::Keypair;
use btm_offline::transaction::{
    IssuanceInput, KeyRing, Output, RawTransaction, SpendInput, Transaction, TransactionBuilder,
};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]========================================{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn ok(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn summarize(tx: &Transaction, started: Instant) {
    field("tx id", tx.tx_id());
    field("size", format!("{} bytes", tx.size()));
    field("fee", tx.fee());
    if tx.fee() != tx.estimated_fee() {
        field("estimated fee", tx.estimated_fee());
    }
    for out in tx.outputs() {
        let tag = if out.is_change { " (change)" } else { "" };
        field(
            &format!("output {}", out.position),
            format!("{}{}", out.output.amount, tag),
        );
    }
    println!(
        "{DIM}  [built in {:.2} ms]{RESET}",
        started.elapsed().as_secs_f64() * 1_000.0
    );
}

fn utxo(owner: &Keypair, amount: u64, position: u64) -> SpendInput {
    SpendInput {
        source_id: Hash::digest(b"demo funding transaction"),
        source_position: position,
        asset_id: FEE_ASSET_ID,
        amount,
        control_program: owner.p2wpkh_program(),
        vm_version: 1,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schedule = FeeSchedule::default();

    section(1, "Keys");
    let alice = Keypair::from_seed(&[0xa1; 32]);
    let bob = Keypair::from_seed(&[0xb0; 32]);
    let keys: KeyRing = [alice.clone(), bob.clone()].into_iter().collect();
    field("alice program", hex::encode(alice.p2wpkh_program()));
    field("bob program", hex::encode(bob.p2wpkh_program()));

    section(2, "Pay bob 3 BTM, change back to alice");
    let started = Instant::now();
    let payment = TransactionBuilder::new()
        .add_input(utxo(&alice, 500_000_000, 0))
        .add_output(Output::fee_asset(300_000_000, bob.p2wpkh_program()))
        .build(&alice.p2wpkh_program(), &keys, &schedule)?;
    summarize(&payment, started);
    ok("signed");

    section(3, "Remainder below the dust threshold");
    let started = Instant::now();
    let dusty = TransactionBuilder::new()
        .add_input(utxo(&alice, 1_805_000, 1))
        .add_output(Output::fee_asset(1_000_000, bob.p2wpkh_program()))
        .build(&alice.p2wpkh_program(), &keys, &schedule)?;
    summarize(&dusty, started);
    ok("dust forfeited to the fee, no change output");

    section(4, "Issue a new asset");
    let issuance = IssuanceInput {
        nonce: IssuanceInput::random_nonce(),
        asset_definition: br#"{"name":"DEMO","decimals":0}"#.to_vec(),
        issuance_program: bob.issuance_program(),
        vm_version: 1,
        amount: 1_000,
    };
    let asset_id = issuance.asset_id()?;
    field("asset id", asset_id);
    let started = Instant::now();
    let minted = TransactionBuilder::new()
        .add_input(issuance)
        .add_input(utxo(&bob, 2_000_000, 2))
        .add_output(Output::new(asset_id, 1_000, alice.p2wpkh_program()))
        .build(&bob.p2wpkh_program(), &keys, &schedule)?;
    summarize(&minted, started);
    ok("issuance signed by bob");

    section(5, "Decode the payment");
    let raw = RawTransaction::from_hex(payment.raw_transaction())?;
    field("version", raw.version);
    field("inputs", raw.inputs.len());
    field("outputs", raw.outputs.len());
    println!("{DIM}  {}{RESET}", payment.raw_transaction());
    ok("round trip complete");

    println!();
    Ok(())
}
