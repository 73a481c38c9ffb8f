//! Leave-attendance reconciliation engine.
//!
//! This crate keeps attendance state consistent with leave-request state for
//! an HR platform: it resolves shift and half-day session boundaries in
//! business-local time, validates check-in/check-out windows, prices
//! punctuality fines under a configurable formula system, computes leave
//! balances with monthly/yearly carry-forward accounting, and drives the
//! leave lifecycle state machine that materializes and reverts per-day
//! attendance records.
//!
//! It is a library invoked in-process: persistence and notification delivery
//! are reached through the seams in [`store`] and [`notify`].

#![warn(missing_docs)]

pub mod balance;
pub mod config;
pub mod error;
pub mod fine;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod schedule;
pub mod store;
