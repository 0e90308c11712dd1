use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};

use terastation_storage::{CheckError, CheckInput, SnmpOptions, SnmpVersion};

#[derive(Debug)]
pub struct Arguments {
    pub host: Option<String>,
    pub community: Option<String>,
    pub warning: Option<String>,
    pub critical: Option<String>,
    pub snmp: SnmpOptions,
    pub verbosity: u8,
}

impl Arguments {
    /// Validates the positional arguments into the input of a check run.
    pub fn into_input(self) -> Result<CheckInput, CheckError> {
        let input = CheckInput::from_args(
            self.host.as_deref(),
            self.community.as_deref(),
            self.warning.as_deref(),
            self.critical.as_deref(),
        )?;

        Ok(input.with_snmp(self.snmp))
    }
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let positional = |name: &str| -> Result<Option<String>> {
            let value = args
                .try_get_one::<String>(name)
                .with_context(|| format!("reading {} argument", name))?;

            Ok(value.cloned())
        };

        let host = positional("host")?;
        let community = positional("community")?;
        let warning = positional("warning")?;
        let critical = positional("critical")?;

        let defaults = SnmpOptions::default();

        let array = args
            .try_get_one::<u32>("array")
            .with_context(|| "reading array option")?
            .copied()
            .unwrap_or(defaults.array);

        let port = args
            .try_get_one::<u16>("port")
            .with_context(|| "reading port option")?
            .copied()
            .unwrap_or(defaults.port);

        let version = match args
            .try_get_one::<String>("snmp-version")
            .with_context(|| "reading snmp-version option")?
        {
            Some(version) => version.parse::<SnmpVersion>()?,
            None => defaults.version,
        };

        let timeout = args
            .try_get_one::<u64>("timeout")
            .with_context(|| "reading timeout option")?
            .map_or(defaults.timeout, |secs| Duration::from_secs(*secs));

        let retries = args
            .try_get_one::<u32>("retries")
            .with_context(|| "reading retries option")?
            .copied()
            .unwrap_or(defaults.retries);

        let verbosity = args.get_count("verbose");

        Ok(Self {
            host,
            community,
            warning,
            critical,
            snmp: SnmpOptions {
                array,
                port,
                version,
                timeout,
                retries,
            },
            verbosity,
        })
    }
}

/// Parses the command line.
///
/// Help and version requests print and exit. Every other problem is a usage
/// error, which the check reports with an OK state.
pub fn args() -> Result<Arguments, CheckError> {
    let arguments = match build().try_get_matches() {
        Ok(arguments) => arguments,
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            e.exit()
        }
        Err(e) => return Err(CheckError::usage(first_line(&e.to_string()))),
    };

    Arguments::try_from(arguments)
        .map_err(|e| CheckError::usage(format!("{:#}", e)))
}

fn first_line(message: &str) -> String {
    let line = message.lines().next().unwrap_or_default();
    let line = line.strip_prefix("error: ").unwrap_or(line);
    line.trim().into()
}

pub fn build() -> Command {
    let host = Arg::new("host")
        .value_name("HOST")
        .help("IP or FQDN of the TeraStation");

    let community = Arg::new("community")
        .value_name("COMMUNITY")
        .help("SNMP community");

    let warning = Arg::new("warning")
        .value_name("WARNING")
        .allow_negative_numbers(true)
        .help("free space in percent at or below which to warn");

    let critical = Arg::new("critical")
        .value_name("CRITICAL")
        .allow_negative_numbers(true)
        .help("free space in percent at or below which it is critical")
        .long_help(
            "Free space in percent at or below which the state is critical. \
             Must not be greater than WARNING.",
        );

    let array = Arg::new("array")
        .short('a')
        .long("array")
        .value_name("N")
        .value_parser(value_parser!(u32).range(1..))
        .help("RAID array index [default: 1]");

    let port = Arg::new("port")
        .short('p')
        .long("port")
        .value_name("PORT")
        .value_parser(value_parser!(u16).range(1..))
        .help("SNMP agent port [default: 161]");

    let version = Arg::new("snmp-version")
        .long("snmp-version")
        .value_name("VERSION")
        .value_parser(["1", "2c"])
        .help("SNMP version [default: 1]");

    let timeout = Arg::new("timeout")
        .short('t')
        .long("timeout")
        .value_name("SECS")
        .value_parser(value_parser!(u64).range(1..))
        .help("seconds to wait for each reply [default: 1]");

    let retries = Arg::new("retries")
        .short('r')
        .long("retries")
        .value_name("N")
        .value_parser(value_parser!(u32))
        .help("requests resent after a timeout [default: 5]");

    let help = Arg::new("help")
        .short('?')
        .long("help")
        .action(ArgAction::Help)
        .help("print help")
        .long_help("Print help.");

    let version_flag = Arg::new("version")
        .long("version")
        .action(ArgAction::Version)
        .hide_short_help(true)
        .long_help("Print version.");

    let verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .help("log diagnostics to stderr, repeat for more");

    Command::new("check_terastation_storage")
        .about("check free space of a Buffalo TeraStation via SNMP")
        .version(crate_version!())
        .arg(host)
        .arg(community)
        .arg(warning)
        .arg(critical)
        .arg(array)
        .arg(port)
        .arg(version)
        .arg(timeout)
        .arg(retries)
        .arg(verbose)
        .disable_help_flag(true)
        .arg(help)
        .disable_version_flag(true)
        .arg(version_flag)
}
