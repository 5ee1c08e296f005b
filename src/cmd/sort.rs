use std::io::Write;

use crate::{
    args::{self, Usage, positional},
    recurrence::Recurrence,
};

const USAGE: &'static str = r#"
Sort frequencies from least to most constrained.

Frequencies are ordered the same way as `freq cmp` orders them. The sort is
stable, so frequencies that compare equal keep the order they were given in.
Each frequency is printed in its canonical notation.

USAGE:
    freq sort <frequency>...
    freq sort < line delimited <frequency>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Sort a few frequencies:

        $ freq sort F2D FT10H F1D F1M
        FT10H
        F1D
        F2D
        F1M

REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut freqs = positional::Recurrences::default();
    args::configure(p, USAGE, &mut [&mut config, &mut freqs])?;

    let mut sorted = vec![];
    freqs.try_map(|freq| {
        sorted.push(freq);
        Ok(true)
    })?;
    if config.reverse {
        sorted.sort_by(|f1, f2| f1.get().compare(f2.get()).reverse());
    } else {
        sorted.sort_by(|f1, f2| f1.get().compare(f2.get()));
    }

    let mut wtr = std::io::stdout().lock();
    for freq in sorted {
        writeln!(wtr, "{freq}")?;
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Config {
    reverse: bool,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('r') | lexopt::Arg::Long("reverse") => {
                self.reverse = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const REVERSE: Usage = Usage::flag(
            "-r, --reverse",
            "Sort from most to least constrained.",
            r#"
Sort from most to least constrained.

Frequencies that compare equal still keep the order they were given in.
"#,
        );

        &[Recurrence::ARG_OR_STDIN, REVERSE]
    }
}
