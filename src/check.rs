use std::fmt;

use tracing::{info, warn};

use crate::error::CheckError;
use crate::input::CheckInput;
use crate::snmp::{self, Agent, ArrayOids};
use crate::storage::{self, StorageReport};

/// Monitoring state, as understood by Nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl Severity {
    /// Process exit code the monitoring system reads this state from.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Ok => "",
            Self::Warning => "Warning - ",
            Self::Critical => "Critical - ",
        }
    }
}

/// Outcome of a run: a state plus the line shown to the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    severity: Severity,
    message: String,
}

impl CheckResult {
    #[must_use]
    pub fn new(severity: Severity, report: &StorageReport) -> Self {
        let message = format!(
            "{}Storage Usage - Total:{} - Used:{} - Free:{}%",
            severity.prefix(),
            report.total_human(),
            report.used_human(),
            report.free_pct()
        );

        Self { severity, message }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.severity.exit_code()
    }
}

impl From<CheckError> for CheckResult {
    /// Only an unreachable agent is critical. Usage errors and implausible
    /// replies are reported with an OK state.
    fn from(err: CheckError) -> Self {
        let severity = match err {
            CheckError::Unreachable { .. } => Severity::Critical,
            CheckError::Usage { .. }
            | CheckError::UnexpectedValue { .. }
            | CheckError::InvalidSize { .. } => Severity::Ok,
        };

        Self {
            severity,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Classifies a free-space percentage; the critical bound wins.
#[must_use]
pub fn classify(
    free_pct: f64,
    warning_pct: f64,
    critical_pct: f64,
) -> Severity {
    if free_pct <= critical_pct {
        Severity::Critical
    } else if free_pct <= warning_pct {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

/// Runs the whole check against `agent`.
///
/// # Errors
///
/// Returns the first [`CheckError`] hit while probing the agent, fetching
/// either value, or computing the report.
pub fn run<A: Agent>(
    agent: &mut A,
    input: &CheckInput,
) -> Result<CheckResult, CheckError> {
    let oids = ArrayOids::for_array(input.snmp().array);

    snmp::probe(agent, input)?;

    let size = snmp::fetch_scalar(agent, input, &oids.size_gb)?;
    let total_gb = storage::ensure_size(size.value())?;

    let used_pct = snmp::fetch_scalar(agent, input, &oids.used_pct)?;

    let report = storage::compute_report(total_gb, used_pct.value())?;
    let severity = classify(
        report.free_pct(),
        input.warning_pct(),
        input.critical_pct(),
    );

    info!(
        free_pct = report.free_pct(),
        free_gb = report.free_gb(),
        ?severity,
        "classified"
    );

    Ok(CheckResult::new(severity, &report))
}

/// Collapses a run into the single result that is printed.
#[must_use]
pub fn conclude(outcome: Result<CheckResult, CheckError>) -> CheckResult {
    outcome.unwrap_or_else(|err| {
        if let CheckError::Unreachable { reason, .. } = &err {
            warn!("{}", reason);
        } else {
            warn!("{:?}", err);
        }

        CheckResult::from(err)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::{anyhow, Result};

    use super::*;
    use crate::input::SnmpOptions;
    use crate::snmp::{Reply, SYS_DESCR};

    #[derive(Default)]
    struct FakeAgent {
        objects: HashMap<String, Reply>,
        requests: Vec<String>,
    }

    impl FakeAgent {
        fn terastation(total_gb: i64, used_pct: i64) -> Self {
            Self::default()
                .with(SYS_DESCR, Reply::Other("OctetString(\"TS5400\")".into()))
                .with("1.3.6.1.4.1.5227.27.1.3.1.3.1", Reply::Integer(total_gb))
                .with("1.3.6.1.4.1.5227.27.1.3.1.4.1", Reply::Integer(used_pct))
        }

        fn with(mut self, oid: &str, reply: Reply) -> Self {
            self.objects.insert(oid.into(), reply);
            self
        }
    }

    impl Agent for FakeAgent {
        fn get(&mut self, oid: &str) -> Result<Reply> {
            self.requests.push(oid.into());

            self.objects
                .get(oid)
                .cloned()
                .ok_or_else(|| anyhow!("request timed out"))
        }
    }

    fn input(warning: &str, critical: &str) -> CheckInput {
        CheckInput::from_args(
            Some("192.168.1.1"),
            Some("public"),
            Some(warning),
            Some(critical),
        )
        .unwrap()
    }

    #[test]
    fn classification() {
        assert_eq!(classify(1.0, 5.0, 2.0), Severity::Critical);
        assert_eq!(classify(2.0, 5.0, 2.0), Severity::Critical);
        assert_eq!(classify(3.0, 5.0, 2.0), Severity::Warning);
        assert_eq!(classify(5.0, 5.0, 2.0), Severity::Warning);
        assert_eq!(classify(10.0, 5.0, 2.0), Severity::Ok);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
    }

    #[test]
    fn warning_end_to_end() {
        let mut agent = FakeAgent::terastation(2000, 75);

        let result = run(&mut agent, &input("30", "10")).unwrap();

        assert_eq!(result.severity(), Severity::Warning);
        assert_eq!(
            result.message(),
            "Warning - Storage Usage - Total:1.95 TB - Used:1.46 TB - Free:25%"
        );
        assert_eq!(
            agent.requests,
            [
                SYS_DESCR,
                "1.3.6.1.4.1.5227.27.1.3.1.3.1",
                "1.3.6.1.4.1.5227.27.1.3.1.4.1",
            ]
        );
    }

    #[test]
    fn ok_has_no_prefix() {
        let mut agent = FakeAgent::terastation(1000, 80);

        let result = run(&mut agent, &input("5", "2")).unwrap();

        assert_eq!(result.exit_code(), 0);
        assert_eq!(
            result.to_string(),
            "Storage Usage - Total:1000 GB - Used:800 GB - Free:20%"
        );
    }

    #[test]
    fn critical() {
        let mut agent = FakeAgent::terastation(4096, 99);

        let result = run(&mut agent, &input("5", "2")).unwrap();

        assert_eq!(result.exit_code(), 2);
        assert_eq!(
            result.message(),
            "Critical - Storage Usage - Total:4 TB - Used:3.96 TB - Free:1%"
        );
    }

    #[test]
    fn second_array() {
        let mut agent = FakeAgent::default()
            .with(SYS_DESCR, Reply::Other("OctetString(\"TS\")".into()))
            .with("1.3.6.1.4.1.5227.27.1.3.1.3.2", Reply::Integer(500))
            .with("1.3.6.1.4.1.5227.27.1.3.1.4.2", Reply::Integer(10));
        let options = SnmpOptions {
            array: 2,
            ..SnmpOptions::default()
        };

        let result =
            run(&mut agent, &input("5", "2").with_snmp(options)).unwrap();

        assert_eq!(
            result.message(),
            "Storage Usage - Total:500 GB - Used:50 GB - Free:90%"
        );
    }

    #[test]
    fn unreachable_stops_after_probe() {
        let mut agent = FakeAgent::default();

        let result = conclude(run(&mut agent, &input("5", "2")));

        assert_eq!(result.exit_code(), 2);
        assert!(result
            .message()
            .starts_with("Cannot reach host: 192.168.1.1, community: public"));
        assert_eq!(agent.requests, [SYS_DESCR]);
    }

    #[test]
    fn zero_size_is_reported_as_ok() {
        let mut agent = FakeAgent::terastation(0, 50);

        let result = conclude(run(&mut agent, &input("5", "2")));

        assert_eq!(result.exit_code(), 0);
        assert_eq!(
            result.message(),
            "Unexpected value: 0 :: Storage size should be greater than 0. \
             Possibly wrong OID for this device."
        );
        // used percentage is never requested
        assert_eq!(agent.requests.len(), 2);
    }

    #[test]
    fn non_integer_is_reported_as_ok() {
        let mut agent = FakeAgent::terastation(1000, 0).with(
            "1.3.6.1.4.1.5227.27.1.3.1.4.1",
            Reply::Other("OctetString(\"80%\")".into()),
        );

        let result = conclude(run(&mut agent, &input("5", "2")));

        assert_eq!(result.exit_code(), 0);
        assert!(result.message().starts_with("Unexpected value: "));
    }

    #[test]
    fn missing_vendor_object_is_critical() {
        let mut agent = FakeAgent::terastation(1000, 50).with(
            "1.3.6.1.4.1.5227.27.1.3.1.3.1",
            Reply::Missing("noSuchObject"),
        );

        let result = conclude(run(&mut agent, &input("5", "2")));

        assert_eq!(result.exit_code(), 2);
        assert!(result
            .message()
            .contains("OID: 1.3.6.1.4.1.5227.27.1.3.1.3.1."));
    }

    #[test]
    fn usage_error_is_ok() {
        let err = CheckInput::from_args(None, None, None, None).unwrap_err();

        let result = CheckResult::from(err);

        assert_eq!(result.severity(), Severity::Ok);
        assert!(result.message().starts_with("Incomplete statement.\n"));
    }
}
