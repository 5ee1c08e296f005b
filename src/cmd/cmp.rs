use std::{cmp::Ordering, io::Write};

use anyhow::Context;

use crate::{
    args::{self, Usage},
    parse::OsStrExt,
    recurrence::Recurrence,
};

const USAGE: &'static str = r#"
Compare two frequencies by how constrained they are.

This prints `less`, `equal` or `greater`. Units are compared from coarsest to
finest. A frequency without a rule on a unit is less than one with a rule on
it. When both have a fixed value for the same unit and scope, the smaller value
is less. Predicates only count for being present.

USAGE:
    freq cmp <frequency> <frequency>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Daily at 10am is less constrained than on the 1st of each month:

        $ freq cmp FT10H F1D
        less

    %snip-start%

    Predicates never decide an ordering:

        $ freq cmp 'F(odd)D' 'F(even)D'
        equal

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    args::configure(p, USAGE, &mut [&mut config])?;

    let [Some(a), Some(b)] = config.freqs else {
        anyhow::bail!("two frequencies are required for comparison")
    };
    let name = match a.get().compare(b.get()) {
        Ordering::Less => "less",
        Ordering::Equal => "equal",
        Ordering::Greater => "greater",
    };
    writeln!(std::io::stdout(), "{name}")?;
    Ok(())
}

#[derive(Debug, Default)]
struct Config {
    freqs: [Option<Recurrence>; 2],
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        let lexopt::Arg::Value(ref mut v) = *arg else { return Ok(false) };
        let Some(slot) = self.freqs.iter_mut().find(|f| f.is_none()) else {
            return Ok(false);
        };
        *slot = Some(v.parse::<Recurrence>().context("invalid frequency")?);
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const FIRST: Usage = Usage::arg(
            "<frequency>",
            "The first frequency, e.g., `F1D/WT15H`.",
            "The first frequency. See `freq next --help` for the format.",
        );
        const SECOND: Usage = Usage::arg(
            "<frequency>",
            "The second frequency, e.g., `FT10H`.",
            "The second frequency. See `freq next --help` for the format.",
        );

        &[FIRST, SECOND]
    }
}
