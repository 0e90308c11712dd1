use std::net::Ipv6Addr;

use anyhow::{anyhow, Context, Result};
use snmp2::{Oid, SyncSession, Value};
use tracing::{debug, info};

use crate::error::CheckError;
use crate::input::{CheckInput, SnmpOptions, SnmpVersion};

/// `sysDescr.0`, read once to see whether the agent answers at all.
pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";

const ARRAY_SIZE_COLUMN: &str = "1.3.6.1.4.1.5227.27.1.3.1.3";
const ARRAY_USED_PCT_COLUMN: &str = "1.3.6.1.4.1.5227.27.1.3.1.4";

/// Buffalo vendor OIDs of one RAID array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayOids {
    pub size_gb: String,
    pub used_pct: String,
}

impl ArrayOids {
    #[must_use]
    pub fn for_array(index: u32) -> Self {
        Self {
            size_gb: format!("{}.{}", ARRAY_SIZE_COLUMN, index),
            used_pct: format!("{}.{}", ARRAY_USED_PCT_COLUMN, index),
        }
    }
}

/// Owned rendering of a single GET reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Integer(i64),
    /// Any other typed value, rendered for messages.
    Other(String),
    /// An SNMPv2 exception such as `noSuchObject`.
    Missing(&'static str),
}

impl From<&Value<'_>> for Reply {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(n) => Self::Integer(*n),
            Value::NoSuchObject => Self::Missing("noSuchObject"),
            Value::NoSuchInstance => Self::Missing("noSuchInstance"),
            Value::EndOfMibView => Self::Missing("endOfMibView"),
            other => Self::Other(format!("{:?}", other)),
        }
    }
}

/// An integer read from one OID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnmpScalar {
    oid: String,
    value: i64,
}

impl SnmpScalar {
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

/// Something that answers SNMP GET requests.
pub trait Agent {
    /// Fetches the value bound to the dotted `oid`.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable reply arrives.
    fn get(&mut self, oid: &str) -> Result<Reply>;
}

/// [`Agent`] backed by a blocking `snmp2` session.
pub struct SnmpAgent {
    session: SyncSession,
    retries: u32,
}

impl SnmpAgent {
    /// Opens a session to the host named in `input`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Unreachable`] if the host does not resolve or the
    /// socket cannot be set up.
    pub fn connect(input: &CheckInput) -> Result<Self, CheckError> {
        let options = input.snmp();
        let target = socket_target(input.host(), options.port);

        debug!(%target, version = ?options.version, "opening SNMP session");

        let session = open_session(&target, input.community(), options)
            .map_err(|e| unreachable_error(input, SYS_DESCR, &e))?;

        Ok(Self {
            session,
            retries: options.retries,
        })
    }

    fn get_once(&mut self, oid: &Oid<'_>) -> Result<Reply, Failure> {
        let resp = self
            .session
            .get(oid)
            .map_err(|e| {
                Failure::NoReply(anyhow!("SNMP GET failed: {:?}", e))
            })?;

        if resp.error_status != 0 {
            return Err(Failure::Rejected(anyhow!(
                "agent returned error-status {}",
                resp.error_status
            )));
        }

        let (_, value) = resp
            .varbinds
            .into_iter()
            .next()
            .ok_or_else(|| {
                Failure::Rejected(anyhow!("SNMP reply is empty"))
            })?;

        Ok(Reply::from(&value))
    }
}

impl Agent for SnmpAgent {
    fn get(&mut self, oid: &str) -> Result<Reply> {
        let parsed = parse_oid(oid)?;
        let retries = self.retries;

        get_with_retries(oid, retries, || self.get_once(&parsed))
    }
}

/// Why a single GET yielded no value.
#[derive(Debug)]
pub enum Failure {
    /// Nothing came back in time; the request may be sent again.
    NoReply(anyhow::Error),
    /// The agent answered, but with an error.
    Rejected(anyhow::Error),
}

/// Sends a GET through `get_once`, resending it up to `retries` times while
/// no reply arrives. A rejected request is not resent.
///
/// # Errors
///
/// Returns the rejection, or the last failure once all attempts are used.
pub fn get_with_retries<F>(
    oid: &str,
    retries: u32,
    mut get_once: F,
) -> Result<Reply>
where
    F: FnMut() -> Result<Reply, Failure>,
{
    let mut attempt = 0;
    loop {
        debug!(oid, attempt, "SNMP GET");

        match get_once() {
            Ok(reply) => return Ok(reply),
            Err(Failure::Rejected(e)) => return Err(e),
            Err(Failure::NoReply(e)) if attempt < retries => {
                debug!(oid, "retrying: {:#}", e);
                attempt += 1;
            }
            Err(Failure::NoReply(e)) => {
                return Err(e).with_context(|| {
                    format!("no reply after {} attempts", attempt + 1)
                })
            }
        }
    }
}

fn open_session(
    target: &str,
    community: &str,
    options: &SnmpOptions,
) -> Result<SyncSession> {
    let timeout = Some(options.timeout);

    let session = match options.version {
        SnmpVersion::V1 => {
            SyncSession::new_v1(target, community.as_bytes(), timeout, 0)
        }
        SnmpVersion::V2c => {
            SyncSession::new_v2c(target, community.as_bytes(), timeout, 0)
        }
    };

    session.with_context(|| format!("creating SNMP session to {}", target))
}

/// Appends the port to a host name or address, bracketing IPv6 literals.
#[must_use]
pub fn socket_target(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Parses a dotted OID such as `1.3.6.1.2.1.1.1.0`.
///
/// The leading dot and `iso` arc that net-snmp prints are accepted.
///
/// # Errors
///
/// Returns an error if an arc is not a number or the OID is not encodable.
pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let arcs = s.trim().trim_start_matches('.');

    let parts = arcs
        .split('.')
        .enumerate()
        .map(|(i, arc)| {
            if i == 0 && arc == "iso" {
                Ok(1)
            } else {
                arc.parse::<u64>()
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid OID: {}", s))?;

    Oid::from(&parts).map_err(|e| anyhow!("cannot encode OID {}: {:?}", s, e))
}

/// Reads `oid` from the agent of `input` and requires an INTEGER reply.
///
/// # Errors
///
/// Returns [`CheckError::Unreachable`] if the GET fails or the object does not
/// exist, and [`CheckError::UnexpectedValue`] if it is not an INTEGER.
pub fn fetch_scalar<A: Agent>(
    agent: &mut A,
    input: &CheckInput,
    oid: &str,
) -> Result<SnmpScalar, CheckError> {
    let reply = agent.get(oid).map_err(|e| unreachable_error(input, oid, &e))?;

    match reply {
        Reply::Integer(value) => {
            info!(oid, value, "fetched");

            Ok(SnmpScalar {
                oid: oid.into(),
                value,
            })
        }
        Reply::Other(value) => Err(CheckError::UnexpectedValue {
            oid: oid.into(),
            value,
        }),
        Reply::Missing(exception) => {
            Err(unreachable_error(input, oid, &anyhow!(exception)))
        }
    }
}

/// Reads `sysDescr.0`; any typed answer counts as reachable.
///
/// # Errors
///
/// Returns [`CheckError::Unreachable`] if the agent does not answer.
pub fn probe<A: Agent>(
    agent: &mut A,
    input: &CheckInput,
) -> Result<(), CheckError> {
    match agent.get(SYS_DESCR) {
        Ok(Reply::Missing(exception)) => {
            Err(unreachable_error(input, SYS_DESCR, &anyhow!(exception)))
        }
        Ok(reply) => {
            debug!(?reply, "agent is reachable");
            Ok(())
        }
        Err(e) => Err(unreachable_error(input, SYS_DESCR, &e)),
    }
}

fn unreachable_error(
    input: &CheckInput,
    oid: &str,
    e: &anyhow::Error,
) -> CheckError {
    CheckError::Unreachable {
        host: input.host().into(),
        community: input.community().into(),
        oid: oid.into(),
        reason: format!("{:#}", e),
    }
}
