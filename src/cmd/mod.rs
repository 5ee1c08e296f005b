mod between;
mod cmp;
mod fmt;
mod next;
mod sort;

const USAGE: &'static str = "\
A utility for finding datetimes that match a recurring frequency.

USAGE:
    freq <command> ...

COMMANDS:
    between  Print every match of a frequency in a range
    cmp      Compare two frequencies
    fmt      Print frequencies in canonical notation
    next     Print the next match of a frequency
    sort     Sort frequencies from least to most constrained
";

pub fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = crate::args::next_as_command(USAGE, p)?;
    match &*cmd {
        "between" => between::run(p),
        "cmp" => cmp::run(p),
        "fmt" => fmt::run(p),
        "next" => next::run(p),
        "sort" => sort::run(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}
