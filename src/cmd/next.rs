use std::io::Write;

use anyhow::Context;

use date_frequency::{Calendar, Unit};

use crate::{
    CAL,
    args::{self, Usage, positional},
    datetime::DateTime,
    parse::OsStrExt,
    recurrence::Recurrence,
};

const USAGE: &'static str = r#"
Print the next datetime matching a frequency.

For each datetime given, this prints the earliest datetime at or after it that
satisfies every rule of the frequency. A datetime that already matches is
printed as is, minus any fractional seconds. When no datetime is given, the
current time is used.

USAGE:
    freq next <frequency> [<datetime>...]
    freq next <frequency> < line delimited <datetime>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Print the next Monday at 15:00:

        $ freq next F1D/WT15H0M0S
        2024-07-22T15:00:00-04:00[America/New_York]

    %snip-start%

    Print the next three times it's 10am, starting today:

        $ freq next -c3 FT10H0M0S today
        2024-07-20T10:00:00-04:00[America/New_York]
        2024-07-21T10:00:00-04:00[America/New_York]
        2024-07-22T10:00:00-04:00[America/New_York]

    Print the first weekend day on or after each of a list of dates:

        $ printf '2024-07-22\n2024-07-27T09:15\n' | freq next 'F(weekend)D/W'
        2024-07-27T00:00:00-04:00[America/New_York]
        2024-07-27T09:15:00-04:00[America/New_York]

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut datetimes = positional::DateTimes::default();
    args::configure(p, USAGE, &mut [&mut config, &mut datetimes])?;

    let freq = config.freq.context("missing frequency")?;
    let count = config.count.unwrap_or(1);
    let mut wtr = std::io::stdout().lock();
    datetimes.try_map_or_now(|dt| {
        let mut from = dt;
        for _ in 0..count {
            let found = freq.next(&from)?;
            writeln!(wtr, "{found}")?;
            from = DateTime::from(CAL.shift(found.get(), Unit::Second, 1)?);
        }
        Ok(true)
    })
}

#[derive(Debug, Default)]
struct Config {
    freq: Option<Recurrence>,
    count: Option<usize>,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('c') | lexopt::Arg::Long("count") => {
                self.count = Some(args::parse(p, "-c/--count")?);
            }
            lexopt::Arg::Value(ref mut v) => {
                if self.freq.is_some() {
                    return Ok(false);
                }
                self.freq = Some(
                    v.parse::<Recurrence>().context("invalid frequency")?,
                );
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const COUNT: Usage = Usage::flag(
            "-c, --count <number>",
            "Print this many successive matches for each datetime.",
            r#"
Print this many successive matches for each datetime.

Each match after the first is the next match at least one second after the
previous one. When this is `0`, nothing is printed. The default is `1`.
"#,
        );

        &[Recurrence::ARG, DateTime::ARG_OR_STDIN, COUNT]
    }
}
