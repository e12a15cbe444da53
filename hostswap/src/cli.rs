use std::{
    io::{BufWriter, Write},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use hidapi::HidApi;
use hidpp_lite::{channel::RawHidChannel, feature::change_host::ChangeHostFeature};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::discovery::{self, Session};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    color: colorchoice_clap::Color,

    /// The host to switch the device to, numbered from 1
    #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
    host: u8,

    /// Only talk to the HID device at this path
    #[arg(long)]
    path: Option<String>,

    /// Skip device number probing and address this device number
    #[arg(long, requires = "path")]
    devnum: Option<u8>,

    /// Skip feature lookup and invoke ChangeHost at this feature table index
    #[arg(long, requires = "devnum")]
    feature_index: Option<u8>,

    /// Give up on unanswered requests after this many milliseconds
    #[arg(
        long,
        default_value_t = 4000,
        value_parser = clap::value_parser!(u64).range(1..=3_600_000)
    )]
    timeout_ms: u64,

    /// Suppress the success line
    #[arg(short, long)]
    silent: bool,

    /// Output plain JSON without color and interactivity
    #[arg(short, long)]
    json: bool,

    /// Log more details about the HID++ traffic (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn execute() -> Result<()> {
    let cli = Cli::parse();

    cli.color.write_global();
    init_logging(cli.verbose);

    let api = HidApi::new().context("could not initialize hidapi")?;
    let timeout = Duration::from_millis(cli.timeout_ms);

    let mut session = open_session(&api, &cli, timeout)?;
    let mut feature = ChangeHostFeature::new(
        &mut session.channel,
        session.device_number,
        session.feature_index,
    );

    ensure_host_exists(&mut feature, cli.host, session.pinned)?;

    feature
        .set_current_host(cli.host - 1)
        .context("failed to switch host")?;

    report(&cli, &session);

    Ok(())
}

fn open_session(api: &HidApi, cli: &Cli, timeout: Duration) -> Result<Session> {
    match (cli.path.as_deref(), cli.devnum, cli.feature_index) {
        (Some(path), Some(device_number), Some(feature_index)) => {
            discovery::open_pinned(api, path, device_number, feature_index, timeout)
        },
        (Some(path), device_number, _) => {
            discovery::probe_path(api, path, device_number, timeout)
        },
        (None, ..) => discovery::discover(api, timeout),
    }
}

/// Cross-checks the wanted host against what the device reports, when it is
/// willing to tell.
///
/// Pinned sessions skip the query; the switch has to stay the only request
/// on the wire.
fn ensure_host_exists<T: RawHidChannel>(
    feature: &mut ChangeHostFeature<'_, T>,
    host: u8,
    pinned: bool,
) -> Result<()> {
    if pinned {
        return Ok(());
    }

    match feature.host_info() {
        Ok(info) if host > info.host_count => {
            bail!(
                "host {} does not exist, the device only knows {} host(s)",
                host,
                info.host_count
            )
        },
        Ok(info) => {
            debug!(
                host_count = info.host_count,
                current_host = info.current_host,
                "host info"
            );

            Ok(())
        },
        // Not every firmware answers the info function. The switch itself
        // will tell.
        Err(err) => {
            debug!(%err, "could not read host info, proceeding");

            Ok(())
        },
    }
}

fn report(cli: &Cli, session: &Session) {
    let mut stdout = BufWriter::new(anstream::stdout());

    if cli.json {
        let outcome = SwitchOutcome {
            host: cli.host,
            device_number: session.device_number,
            feature_index: session.feature_index,
            path: &session.path,
        };

        writeln!(stdout, "{}", json!(outcome)).unwrap();
    } else if !cli.silent {
        writeln!(
            stdout,
            "Switched host to {} (device number {}, feature index {}) via {}",
            cli.host.green(),
            session.device_number,
            session.feature_index,
            session.path.bright_black(),
        )
        .unwrap();
    }

    stdout.flush().unwrap();
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hostswap={level},hidpp_lite={level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
struct SwitchOutcome<'a> {
    host: u8,
    device_number: u8,
    feature_index: u8,
    path: &'a str,
}
