use std::{env, io::Write, process::ExitCode, sync::LazyLock};

use {
    anyhow::Context,
    date_frequency::{Predicates, ZonedCalendar, predicate},
    jiff::{Timestamp, Zoned, tz::TimeZone},
};

mod args;
mod cmd;
mod datetime;
mod logger;
mod parse;
mod recurrence;
mod style;

static TZ: LazyLock<TimeZone> = LazyLock::new(|| TimeZone::system());

static NOW: LazyLock<Zoned> = LazyLock::new(|| {
    let ts = match read_env_freq_now() {
        Ok(Some(ts)) => {
            log::trace!(
                "setting current time to `{ts}` from `FREQ_NOW` \
                 environment variable",
            );
            ts
        }
        Ok(None) => {
            let now = Timestamp::now();
            log::trace!(
                "`FREQ_NOW` environment variable not set, using \
                 current time `{now}`",
            );
            now
        }
        Err(err) => {
            let now = Timestamp::now();
            log::warn!(
                "reading `FREQ_NOW` failed, using current time \
                 `{now}`: {err:#}",
            );
            now
        }
    };
    ts.to_zoned(TZ.clone())
});

/// The calendar every command evaluates frequencies in.
static CAL: LazyLock<ZonedCalendar> =
    LazyLock::new(|| ZonedCalendar::new(TZ.clone()));

/// The predicates that frequencies given on the command line may name.
static PREDICATES: LazyLock<Predicates> = LazyLock::new(|| {
    Predicates::new()
        .with("odd", predicate::odd)
        .with("even", predicate::even)
        .with("leap", predicate::leap_year)
        .with("weekend", predicate::weekend)
});

/// Every so often, and then some more.
fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    let root = err.root_cause();
    if let Some(help) = root.downcast_ref::<args::Help>() {
        writeln!(&mut std::io::stdout(), "{help}").unwrap();
        return ExitCode::SUCCESS;
    }
    if let Some(version) = root.downcast_ref::<args::Version>() {
        writeln!(&mut std::io::stdout(), "{version}").unwrap();
        return ExitCode::SUCCESS;
    }
    // A closed stdout, e.g., `freq next ... | head -n1`, isn't a failure.
    // The Rust runtime ignores SIGPIPE, so we see it as an I/O error
    // instead of being terminated by the signal.
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::from(0);
            }
        }
        // `serde_json` wraps the I/O errors it hits while writing, so
        // look inside of it too.
        if let Some(err) = cause.downcast_ref::<serde_json::Error>() {
            if let Some(kind) = err.io_error_kind() {
                if kind == std::io::ErrorKind::BrokenPipe {
                    return ExitCode::from(0);
                }
            }
        }
    }
    if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(&mut std::io::stderr(), "{:?}", err).unwrap();
    } else {
        writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
    }
    ExitCode::from(1)
}

fn run() -> anyhow::Result<ExitCode> {
    let freqlog = env::var("FREQ_LOG").unwrap_or_else(|_| String::new());
    let level = match &*freqlog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    log::set_max_level(level);
    // Resolving `TZ` may itself log, so the logger starts out in UTC and
    // only switches to the system time zone once that has happened.
    let logger = logger::Logger::init()?;
    logger.set_time_zone(TZ.clone());
    cmd::run(&mut lexopt::Parser::from_env())?;
    Ok(ExitCode::SUCCESS)
}

fn read_env_freq_now() -> anyhow::Result<Option<Timestamp>> {
    let Some(val) = std::env::var_os("FREQ_NOW") else { return Ok(None) };
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`FREQ_NOW` environment variable is not valid UTF-8: {val:?}"
        )
    };
    val.parse::<Timestamp>().map(Some).context(
        "`FREQ_NOW` environment variable is not a valid RFC 3339 timestamp",
    )
}
