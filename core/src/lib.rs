// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # EduChain — Core Library
//!
//! Everything the EduChain platform knows how to do, minus the HTTP. The
//! server crate is a thin façade over this one: issuing credentials on the
//! test network, scoring loan applications against the credentials a
//! borrower holds, and keeping the platform's own records.
//!
//! ## Architecture
//!
//! - **config** — Platform constants: addresses, byte budgets, scoring weights.
//! - **credential** — Records, the lossy annotation codec, issuance and
//!   verification against the ledger.
//! - **lending** — Credential-based loan scoring and the offer flow.
//! - **ledger** — Transaction envelopes and the simulated test network.
//! - **storage** — Users, courses, enrollments, stored credential rows.
//!
//! ## Design Notes
//!
//! 1. The codec is deliberately lossy and the decoder is total. Annotations
//!    that outgrew their channel still verify, just at a lower fidelity.
//! 2. Scoring is pure. Same credentials in, same assessment out, in any
//!    order, with no clock and no I/O.
//! 3. The ledger is simulated in-process so every flow above it can run in
//!    a test without network access.

pub mod config;
pub mod credential;
pub mod ledger;
pub mod lending;
pub mod storage;
