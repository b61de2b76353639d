//! Core types and trait definitions for the slotbook scheduler.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; mail transports
//! implement [`notify::Notifier`]. The booking workflow and the reminder
//! job are expressed against those traits only.

pub mod booking;
pub mod error;
pub mod notify;
pub mod participant;
pub mod reminder;
pub mod reservation;
pub mod slot;
pub mod store;
pub mod validate;

#[cfg(test)]
mod fake;

pub use error::{Error, Result};
