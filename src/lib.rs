#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

//! Nagios check for the free space of a Buffalo TeraStation RAID array.
//!
//! The array size and used percentage are read over SNMP from the Buffalo
//! enterprise tree, turned into a [`StorageReport`] and classified against a
//! warning and a critical free-space threshold.

pub mod check;
pub mod error;
pub mod input;
pub mod logging;
pub mod snmp;
pub mod storage;

pub use check::{classify, conclude, run, CheckResult, Severity};
pub use error::CheckError;
pub use input::{CheckInput, SnmpOptions, SnmpVersion};
pub use snmp::{fetch_scalar, probe, Agent, SnmpAgent, SnmpScalar};
pub use storage::{compute_report, humanize, StorageReport};
