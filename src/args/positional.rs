use std::io::IsTerminal;

use {
    anyhow::Context,
    bstr::{BStr, BString, ByteSlice, ByteVec},
};

use crate::{
    args::Configurable,
    datetime::DateTime,
    parse::{BufReadExt, BytesExt, Line},
    recurrence::Recurrence,
};

/// The CLI parsing configuration for reading datetimes.
///
/// This greedily consumes all remaining positional arguments as datetimes.
/// When there are none, datetimes are read from stdin, one per line.
#[derive(Clone, Debug, Default)]
pub struct DateTimes(Arguments);

impl DateTimes {
    /// Run the given function over each datetime read from the CLI.
    ///
    /// When no datetimes were given at all, i.e., there are no positional
    /// datetimes and stdin is a terminal or empty, the function is called
    /// once with the current time.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map_or_now(
        self,
        mut f: impl FnMut(DateTime) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        if self.0.positional.is_empty() && std::io::stdin().is_terminal() {
            log::debug!("no datetimes given, using the current time");
            f(DateTime::now())?;
            return Ok(());
        }
        let mut any = false;
        self.0.try_map(|arg| {
            any = true;
            f(arg.to_datetime()?)
        })?;
        if !any {
            log::debug!("no datetimes on stdin, using the current time");
            f(DateTime::now())?;
        }
        Ok(())
    }
}

impl Configurable for DateTimes {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        self.0.configure(p, arg)
    }
}

/// The CLI parsing configuration for reading frequencies.
///
/// This greedily consumes all remaining positional arguments as frequencies.
/// When there are none, frequencies are read from stdin, one per line.
#[derive(Clone, Debug, Default)]
pub struct Recurrences(Arguments);

impl Recurrences {
    /// Run the given function over each frequency read from the CLI.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map(
        self,
        mut f: impl FnMut(Recurrence) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        self.0.try_map(|arg| f(arg.to_recurrence()?))
    }
}

impl Configurable for Recurrences {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        self.0.configure(p, arg)
    }
}

/// Arguments read either as positional arguments on the CLI or as
/// line-delimited data on stdin.
///
/// Stdin is only read when there are _zero_ positional arguments.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    positional: Vec<BString>,
}

impl Arguments {
    /// Run the given function over each argument.
    ///
    /// The argument given to the closure is either always `Positional` or
    /// always `StdinLine`. You never get a mix.
    ///
    /// Iteration stops when the closure returns false or returns an error.
    pub fn try_map(
        self,
        mut f: impl FnMut(Argument<'_>) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        if !self.positional.is_empty() {
            for arg in self.positional {
                if !f(Argument::Positional(arg))? {
                    break;
                }
            }
            return Ok(());
        }
        std::io::stdin().lock().for_byte_line(|line| {
            f(Argument::StdinLine(line))
                .with_context(|| format!("line {} of <stdin>", line.number()))
        })
    }
}

impl Configurable for Arguments {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        let lexopt::Arg::Value(ref mut v) = *arg else { return Ok(false) };
        let bytes = Vec::from_os_string(std::mem::take(v)).map_err(|arg| {
            anyhow::anyhow!(
                "freq requires that positional arguments \
                 be valid UTF-8 in non-Unix environments, \
                 but `{arg:?}` is not valid UTF-8",
            )
        })?;
        self.positional.push(BString::from(bytes));
        Ok(true)
    }
}

/// A single argument from either the CLI or a line on stdin.
#[derive(Clone, Debug)]
pub enum Argument<'a> {
    /// A positional argument. On Windows, this is always valid UTF-8.
    Positional(BString),
    /// A line from stdin.
    StdinLine(Line<'a>),
}

impl<'a> Argument<'a> {
    pub fn to_datetime(&self) -> anyhow::Result<DateTime> {
        self.raw().parse::<DateTime>().context("invalid datetime")
    }

    pub fn to_recurrence(&self) -> anyhow::Result<Recurrence> {
        self.raw().parse::<Recurrence>().context("invalid frequency")
    }

    /// Returns the argument without any line terminator.
    pub fn raw(&self) -> &BStr {
        match *self {
            Argument::Positional(ref arg) => arg.as_bstr(),
            Argument::StdinLine(line) => line.content(),
        }
    }
}
