//! Cybozu Garoon calendar source for calmap.
//!
//! Talks to a Garoon server over its SOAP API: endpoint discovery from
//! the published WSDL, WS-Security request envelopes, fault-aware
//! response parsing, and conversion of `schedule_event` nodes into
//! [`calmap_core::Event`] values (with repeating events expanded).

pub mod client;
pub mod config;
pub mod error;
pub mod schedule;
pub mod soap;
pub mod wsdl;

pub use client::GaroonClient;
pub use config::GaroonConfig;
pub use error::{GaroonError, GaroonResult};
