use {
    anyhow::Context,
    bstr::BStr,
    jiff::{Zoned, civil, fmt, tz},
};

use crate::{
    NOW,
    args::Usage,
    parse::{BytesExt, FromBytes},
};

static TEMPORAL_PARSER: fmt::temporal::DateTimeParser =
    fmt::temporal::DateTimeParser::new();
static RFC2822_PARSER: fmt::rfc2822::DateTimeParser =
    fmt::rfc2822::DateTimeParser::new();

/// A datetime parsed from user input.
///
/// Every datetime is a zoned datetime. When the input doesn't say which time
/// zone it's in, the system time zone (i.e., `TZ`) is used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateTime {
    zdt: Zoned,
}

impl DateTime {
    pub const ARG_OR_STDIN: Usage = Usage::arg(
        "<datetime>",
        "A datetime, e.g., `now`, `2025-03-15` or `2025-03-15T00:00Z`.",
        r#"
Zero or more datetimes to search from.

Datetimes are either passed as positional arguments or as line delimited
data on stdin, but not both. When there are no datetimes given as positional
arguments and stdin is a terminal, the current time is used.

The following formats are accepted:

An RFC 9557 timestamp, e.g., `2025-03-15T10:23:00-04:00[America/New_York]`.
The time zone annotation is kept, which matters for frequencies that cross a
daylight saving time transition.

An RFC 3339 timestamp, e.g., `2025-03-15T10:23:00-04:00`, or an RFC 2822
timestamp, e.g., `Sat, 15 Mar 2025 10:23:00 -0400`.

An ISO 8601 date or datetime without an offset, e.g., `2025-03-15` or
`2025-03-15T10:23`. It is interpreted as a local time in your system's time
zone, which may be overridden with the `TZ` environment variable. A missing
time means the first instant of the day.

A clock time, e.g., `08:30` or `17:45:10`, on the current date.

`now` is the current time. It is computed once when freq starts, or taken from
the `FREQ_NOW` environment variable when set. `today`, `yesterday` and
`tomorrow` are the first instants of those days.
"#,
    );

    pub const START: Usage = Usage::arg(
        "<start>",
        "The datetime to start searching from, e.g., `today`.",
        "The first datetime considered. The accepted formats are the same \
         as for any other datetime, see `freq next --help`.",
    );

    pub const END: Usage = Usage::arg(
        "<end>",
        "The exclusive upper bound of the search, e.g., `2025-04-01`.",
        "No datetime at or after this one is printed. The accepted formats \
         are the same as for any other datetime, see `freq next --help`.",
    );

    pub fn now() -> DateTime {
        DateTime { zdt: NOW.clone() }
    }

    /// Parses a datetime, resolving relative formats like `today` or `08:30`
    /// against `relative`. Datetimes without a time zone or offset are put
    /// in the time zone of `relative`.
    pub fn parse_relative(
        relative: &Zoned,
        s: &[u8],
    ) -> anyhow::Result<DateTime> {
        // The most specific format goes first. Its error is kept around in
        // case the input turns out to have a time zone annotation.
        let temporal_parse_err = match TEMPORAL_PARSER.parse_zoned(s) {
            Err(err) => err,
            Ok(zdt) => return Ok(DateTime::from(zdt)),
        };
        if let Ok(pieces) = fmt::temporal::Pieces::parse(s) {
            // An annotation means the RFC 9557 parse failed for some other
            // reason, like an unknown time zone or an inconsistent offset.
            if pieces.time_zone_annotation().is_some() {
                return Err(temporal_parse_err.into());
            }
            let time = pieces.time().unwrap_or(civil::Time::midnight());
            let dt = pieces.date().to_datetime(time);
            let zdt = match pieces.offset() {
                None => dt.to_zoned(relative.time_zone().clone())?,
                Some(fmt::temporal::PiecesOffset::Zulu) => {
                    dt.to_zoned(tz::TimeZone::UTC)?
                }
                Some(fmt::temporal::PiecesOffset::Numeric(ref off)) => {
                    dt.to_zoned(tz::TimeZone::fixed(off.offset()))?
                }
                Some(unk) => {
                    anyhow::bail!("unrecognized parsed offset: {unk:?}")
                }
            };
            return Ok(DateTime::from(zdt));
        }
        if let Ok(zdt) = RFC2822_PARSER.parse_zoned(s) {
            return Ok(DateTime::from(zdt));
        }
        if let Some(zdt) = parse_relative(relative, BStr::new(s))? {
            return Ok(DateTime::from(zdt));
        }
        anyhow::bail!("unrecognized datetime `{s}`", s = BStr::new(s))
    }

    pub fn get(&self) -> &Zoned {
        &self.zdt
    }
}

impl From<Zoned> for DateTime {
    fn from(zdt: Zoned) -> DateTime {
        DateTime { zdt }
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.zdt, f)
    }
}

impl std::str::FromStr for DateTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<DateTime> {
        s.as_bytes().parse()
    }
}

impl FromBytes for DateTime {
    type Err = anyhow::Error;

    fn from_bytes(s: &[u8]) -> anyhow::Result<DateTime> {
        DateTime::parse_relative(&NOW, s)
    }
}

/// Parses the datetimes that only make sense relative to another one.
///
/// `None` is returned when `s` isn't one of them.
fn parse_relative(
    relative: &Zoned,
    s: &BStr,
) -> anyhow::Result<Option<Zoned>> {
    let zdt = match &**s {
        b"now" => relative.clone(),
        b"today" => relative.start_of_day()?,
        b"yesterday" => relative.yesterday()?.start_of_day()?,
        b"tomorrow" => relative.tomorrow()?.start_of_day()?,
        _ => return parse_time(relative, s),
    };
    Ok(Some(zdt))
}

/// Parses a clock time on the same day as `relative`.
fn parse_time(relative: &Zoned, s: &BStr) -> anyhow::Result<Option<Zoned>> {
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = civil::Time::strptime(fmt, s) {
            let zdt = relative.with().time(time).build().with_context(|| {
                format!("failed to use {time} on {relative}")
            })?;
            return Ok(Some(zdt));
        }
    }
    Ok(None)
}
