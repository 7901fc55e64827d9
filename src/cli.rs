use std::env;
use std::ffi::OsString;
use std::time::Duration;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command, command, value_parser};
use color_eyre::eyre;
use tracing::Level;
use url::Url;
use wsd_scan_rs::proto::Protocol;

use crate::config::Config;

fn build_clap_command() -> Command {
    command!()
        .disable_version_flag(true)
        .color(clap::ColorChoice::Always)
        .long_version(format!(
            "- WS-Scan capability discovery, v{}",
            env!("CARGO_PKG_VERSION")
        ))
        .version(format!("v{}", env!("CARGO_PKG_VERSION")))
        .arg(
            Arg::new("url")
                .long("url")
                .short('u')
                .help("scan service endpoint of the device")
                .required(true)
                .value_parser(value_parser!(Url)),
        )
        .arg(
            Arg::new("protocol")
                .short('p')
                .long("protocol")
                .help("protocol to query the device with")
                .default_value("WSD")
                .value_parser(to_protocol),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .help("set timeout for the capability query")
                .value_parser(float_to_duration_parser)
                .default_value("5.0"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("increase verbosity")
                .default_value("0")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .help("show version number and exit")
                .action(ArgAction::Version),
        )
}

fn float_to_duration_parser(value: &str) -> Result<Duration, String> {
    let value = value.parse::<f32>().map_err(|error| error.to_string())?;

    Duration::try_from_secs_f32(value).map_err(|error| error.to_string())
}

fn to_protocol(name: &str) -> Result<Protocol, String> {
    Protocol::from_name(name).ok_or_else(|| format!("unknown protocol `{}`", name))
}

pub fn parse_cli() -> Result<Config, eyre::Report> {
    parse_cli_from(env::args_os())
}

pub fn parse_cli_from<I, T>(from: I) -> Result<Config, eyre::Report>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = build_clap_command();

    let matches = command.try_get_matches_from_mut(from)?;

    let verbosity = match get_user_cli_value::<u8>(&matches, "verbose") {
        None | Some(&0) => Level::WARN,
        Some(&1) => Level::INFO,
        Some(_) => Level::DEBUG,
    };

    let config = Config {
        url: matches
            .get_one::<Url>("url")
            .cloned()
            .expect("url is required"),
        protocol: *matches
            .get_one("protocol")
            .expect("protocol has a default"),
        timeout: matches
            .get_one("timeout")
            .copied()
            .expect("timeout has a default"),
        verbosity,
    };

    Ok(config)
}

fn get_user_cli_value<'a, T>(matches: &'a clap::ArgMatches, key: &str) -> Option<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    // our CLI has defaults, so we check if the user has provided a value
    let Some(ValueSource::CommandLine) = matches.value_source(key) else {
        return None;
    };

    matches.get_one::<T>(key)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tracing::Level;
    use wsd_scan_rs::proto::Protocol;

    use crate::cli::{float_to_duration_parser, parse_cli_from, to_protocol};

    const URL: &str = "http://192.168.1.20:5358/wsd/scan";

    #[test]
    fn url() {
        let config = parse_cli_from(["wsd-scan-rs", "--url", URL]).unwrap();

        assert_eq!(config.url.as_str(), URL);
        assert_eq!(config.protocol, Protocol::Wsd);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn url_is_required() {
        let result = parse_cli_from(["wsd-scan-rs"]);

        assert!(result.is_err());
    }

    #[test]
    fn invalid_url() {
        let result = parse_cli_from(["wsd-scan-rs", "--url", "not a url"]);

        assert!(result.is_err());
    }

    #[test]
    fn no_verbose() {
        let config = parse_cli_from(["wsd-scan-rs", "--url", URL]).unwrap();

        assert_eq!(config.verbosity, Level::WARN);
    }

    #[test]
    fn verbose() {
        let config = parse_cli_from(["wsd-scan-rs", "--url", URL, "--verbose"]).unwrap();

        assert_eq!(config.verbosity, Level::INFO);
    }

    #[test]
    fn very_verbose() {
        let config = parse_cli_from(["wsd-scan-rs", "--url", URL, "-vv"]).unwrap();

        assert_eq!(config.verbosity, Level::DEBUG);
    }

    #[test]
    fn timeout() {
        let config = parse_cli_from(["wsd-scan-rs", "--url", URL, "--timeout", "0.5"]).unwrap();

        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn negative_timeout() {
        assert!(float_to_duration_parser("-1").is_err());
        assert!(float_to_duration_parser("soon").is_err());
    }

    #[test]
    fn protocol() {
        assert!(matches!(to_protocol("wsd"), Ok(Protocol::Wsd)));
        assert!(matches!(
            to_protocol("eSCL").err().as_deref(),
            Some("unknown protocol `eSCL`")
        ));
    }
}
