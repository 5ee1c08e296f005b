use std::io::Write;

use crate::{
    args::{self, Usage, positional},
    recurrence::Recurrence,
};

const USAGE: &'static str = r#"
Print frequencies in their canonical notation.

Each frequency may be given in notation or as a JSON rule map. The canonical
notation lists rules from coarsest to finest unit and omits scopes that are a
unit's default. Two frequencies with the same rules always have the same
canonical notation.

USAGE:
    freq fmt <frequency>...
    freq fmt < line delimited <frequency>

TIP:
    use -h for short docs and --help for long docs

EXAMPLES:
    Canonicalize a couple of frequencies:

        $ freq fmt F3M/Y FT10S/H F1D/W15D
        F3M
        FT10S/h
        F15D1D/W

    %snip-start%

    Convert a JSON rule map to notation:

        $ freq fmt '{"day": {"week": 3}, "hour": 10, "minute": 0}'
        F3D/WT10H0M

    Print the rules of a frequency as JSON:

        $ freq fmt --json F1D/WT15H
        {"frequency":"F1D/WT15H","rules":[{"scope":"week","unit":"day","value":1},{"scope":"day","unit":"hour","value":15}]}

    %snip-end%
REQUIRED ARGUMENTS:
%args%
OPTIONS:
%flags%
"#;

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let mut config = Config::default();
    let mut freqs = positional::Recurrences::default();
    args::configure(p, USAGE, &mut [&mut config, &mut freqs])?;

    let mut wtr = std::io::stdout().lock();
    freqs.try_map(|freq| {
        if config.json {
            serde_json::to_writer(&mut wtr, &freq.to_json())?;
            writeln!(wtr)?;
        } else {
            writeln!(wtr, "{freq}")?;
        }
        Ok(true)
    })
}

#[derive(Debug, Default)]
struct Config {
    json: bool,
}

impl args::Configurable for Config {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Long("json") => {
                self.json = true;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const JSON: Usage = Usage::flag(
            "--json",
            "Print each frequency's rules as a line of JSON.",
            r#"
Print each frequency's rules as a line of JSON.

Each line is an object with the canonical notation in `frequency` and a list
of `rules`. Every rule has a `unit`, the `scope` it's measured within, and a
`value` that is either a number or the name of a predicate.
"#,
        );

        &[Recurrence::ARG_OR_STDIN, JSON]
    }
}
