use thiserror::Error;

/// Invocation line shown after every usage error.
pub const USAGE: &str =
    "USAGE: check_terastation_storage HOST COMMUNITY WARNING CRITICAL";

/// Everything that can end a check before a storage status is known.
#[derive(Debug, Error, PartialEq)]
pub enum CheckError {
    /// Missing or malformed arguments, or inverted thresholds.
    #[error("{reason}\n{}", USAGE)]
    Usage { reason: String },

    /// The agent did not answer a GET, or answered it with an error.
    #[error(
        "Cannot reach host: {host}, community: {community}, OID: {oid}. \
         Possibly offline, SNMP is not enabled, COMMUNITY string is invalid, \
         or wrong OID for this device."
    )]
    Unreachable {
        host: String,
        community: String,
        oid: String,
        reason: String,
    },

    /// The agent answered with something other than an INTEGER.
    #[error("Unexpected value: {value} :: Possibly wrong OID for this device.")]
    UnexpectedValue { oid: String, value: String },

    /// The array size is not positive.
    #[error(
        "Unexpected value: {total_gb} :: Storage size should be greater than 0. \
         Possibly wrong OID for this device."
    )]
    InvalidSize { total_gb: i64 },
}

impl CheckError {
    pub fn usage(reason: impl Into<String>) -> Self {
        Self::Usage {
            reason: reason.into(),
        }
    }
}
