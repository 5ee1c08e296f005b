use std::io::Write;

use anyhow::Context;

use crate::{
    args::{self, Usage},
    datetime::DateTime,
    parse::OsStrExt,
    recurrence::Recurrence,
};

const USAGE: &'static str = r#"
Print every datetime matching a frequency within a range.

Matches are printed in chronological order, starting with the first match at or
after <start> and ending with the last match before <end>. When <end> is at or
before <start>, nothing is printed.

USAGE:
    freq between <frequency> <start> <end>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Print every Monday at 09:00 in July 2024:

        $ freq between F1D/WT9H0M0S 2024-07-01 2024-08-01
        2024-07-01T09:00:00-04:00[America/New_York]
        2024-07-08T09:00:00-04:00[America/New_York]
        2024-07-15T09:00:00-04:00[America/New_York]
        2024-07-22T09:00:00-04:00[America/New_York]
        2024-07-29T09:00:00-04:00[America/New_York]

    %snip-start%

    Print noon on the even days of the month for the next week:

        $ freq between 'F(even)DT12H0M0S' 2024-07-28 2024-08-03
        2024-07-28T12:00:00-04:00[America/New_York]
        2024-07-30T12:00:00-04:00[America/New_York]
        2024-08-02T12:00:00-04:00[America/New_York]

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    args::configure(p, USAGE, &mut [&mut config])?;

    let freq = config.freq.context("missing frequency")?;
    let start = config.start.context("missing start datetime")?;
    let end = config.end.context("missing end datetime")?;
    let mut remaining = config.count;
    let mut wtr = std::io::stdout().lock();
    freq.between(&start, &end, |dt| {
        if let Some(ref mut remaining) = remaining {
            if *remaining == 0 {
                return Ok(false);
            }
            *remaining -= 1;
        }
        writeln!(wtr, "{dt}")?;
        Ok(true)
    })
}

#[derive(Debug, Default)]
struct Config {
    freq: Option<Recurrence>,
    start: Option<DateTime>,
    end: Option<DateTime>,
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
                if self.freq.is_none() {
                    let freq = v.parse::<Recurrence>();
                    self.freq = Some(freq.context("invalid frequency")?);
                } else if self.start.is_none() {
                    let start = v.parse::<DateTime>();
                    let start = start.context("invalid start datetime")?;
                    self.start = Some(start);
                } else if self.end.is_none() {
                    let end = v.parse::<DateTime>();
                    self.end = Some(end.context("invalid end datetime")?);
                } else {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const COUNT: Usage = Usage::flag(
            "-c, --count <number>",
            "Print at most this many matches.",
            r#"
Print at most this many matches.

The search stops as soon as this many matches have been printed, even when
<end> is far in the future.
"#,
        );

        &[Recurrence::ARG, DateTime::START, DateTime::END, COUNT]
    }
}
