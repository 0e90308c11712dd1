use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::error::CheckError;

/// SNMP protocol version spoken to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnmpVersion {
    V1,
    V2c,
}

impl FromStr for SnmpVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1" | "v1" => Ok(Self::V1),
            "2c" | "v2c" => Ok(Self::V2c),
            _ => Err(anyhow!("unsupported SNMP version {}", s)),
        }
    }
}

/// How to reach the agent, and which array to read.
#[derive(Clone, Debug, PartialEq)]
pub struct SnmpOptions {
    pub array: u32,
    pub port: u16,
    pub version: SnmpVersion,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for SnmpOptions {
    /// Array 1 over SNMPv1, with the net-snmp client timeout and retries.
    fn default() -> Self {
        Self {
            array: 1,
            port: 161,
            version: SnmpVersion::V1,
            timeout: Duration::from_secs(1),
            retries: 5,
        }
    }
}

/// Validated parameters of one check run.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckInput {
    host: String,
    community: String,
    warning_pct: f64,
    critical_pct: f64,
    snmp: SnmpOptions,
}

impl CheckInput {
    /// Validates the four positional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Usage`] if an argument is missing, a threshold
    /// is not a number, the warning threshold is below the critical one, or
    /// host or community is empty.
    pub fn from_args(
        host: Option<&str>,
        community: Option<&str>,
        warning: Option<&str>,
        critical: Option<&str>,
    ) -> Result<Self, CheckError> {
        let (host, community, warning, critical) =
            match (host, community, warning, critical) {
                (Some(h), Some(c), Some(w), Some(cr)) => (h, c, w, cr),
                _ => return Err(CheckError::usage("Incomplete statement.")),
            };

        let warning_pct = parse_threshold(warning)
            .map_err(|e| CheckError::usage(format!("{:#}", e)))?;
        let critical_pct = parse_threshold(critical)
            .map_err(|e| CheckError::usage(format!("{:#}", e)))?;

        if warning_pct < critical_pct {
            return Err(CheckError::usage(
                "The WARNING value cannot be lower than the CRITICAL value.",
            ));
        }

        if host.is_empty() || community.is_empty() {
            return Err(CheckError::usage(
                "Error, host and/or community is empty.",
            ));
        }

        Ok(Self {
            host: host.into(),
            community: community.into(),
            warning_pct,
            critical_pct,
            snmp: SnmpOptions::default(),
        })
    }

    #[must_use]
    pub fn with_snmp(mut self, snmp: SnmpOptions) -> Self {
        self.snmp = snmp;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn community(&self) -> &str {
        &self.community
    }

    #[must_use]
    pub const fn warning_pct(&self) -> f64 {
        self.warning_pct
    }

    #[must_use]
    pub const fn critical_pct(&self) -> f64 {
        self.critical_pct
    }

    #[must_use]
    pub const fn snmp(&self) -> &SnmpOptions {
        &self.snmp
    }
}

fn parse_threshold(s: &str) -> Result<f64> {
    let value = s
        .trim()
        .parse::<f64>()
        .with_context(|| format!("threshold {} is not a number", s))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(anyhow!("threshold {} is not a finite number", s))
    }
}
