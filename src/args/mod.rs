use std::{
    fmt::{Debug, Display, Write},
    str::FromStr,
    sync::LazyLock,
};

use {
    anyhow::Context,
    lexopt::{Arg, Parser, ValueExt},
    regex::Regex,
};

pub mod positional;

/// A piece of command line configuration that claims the arguments it
/// understands.
pub trait Configurable: Debug {
    /// Returns `true` when `arg` was consumed by this configuration.
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool>;

    /// The docs for the flags and arguments that `configure` consumes.
    fn usage(&self) -> &[Usage] {
        &[]
    }
}

/// Feeds every remaining argument in `p` to the first of `targets` that
/// accepts it.
///
/// `-h`, `--help` and `--version` are handled here and returned as `Help`
/// and `Version` errors. Any argument that no target accepts is an error.
pub fn configure(
    p: &mut Parser,
    usage: &str,
    targets: &mut [&mut dyn Configurable],
) -> anyhow::Result<()> {
    while let Some(arg) = p.next()? {
        match arg {
            Arg::Short('h') => return Err(help(usage, targets, false).into()),
            Arg::Long("help") => return Err(help(usage, targets, true).into()),
            Arg::Long("version") => return Err(Version.into()),
            _ => {}
        }
        // Long flag names borrow from `p`, which `configure` needs
        // mutably. So give them a home of their own.
        let long_flag: Option<String> = match arg {
            Arg::Long(name) => Some(name.to_string()),
            _ => None,
        };
        let mut arg = match long_flag {
            Some(ref flag) => Arg::Long(flag),
            None => match arg {
                Arg::Short(c) => Arg::Short(c),
                Arg::Long(_) => unreachable!(),
                Arg::Value(value) => Arg::Value(value),
            },
        };
        let mut recognized = false;
        for t in targets.iter_mut() {
            if t.configure(p, &mut arg)? {
                recognized = true;
                break;
            }
        }
        if !recognized {
            return Err(arg.unexpected().into());
        }
    }
    Ok(())
}

/// Renders the usage docs of a command.
///
/// Everything between `%snip-start%` and `%snip-end%` only shows up in the
/// long docs. `%args%` and `%flags%` are replaced with the docs collected
/// from `targets`.
fn help(usage: &str, targets: &[&mut dyn Configurable], long: bool) -> Help {
    static REMOVE_SNIPS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*%snip-start%\p{any}*?%snip-end%\s*$").unwrap()
    });
    static REMOVE_SNIP_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*%snip-(start|end)%\s*$").unwrap()
    });

    let mut args = vec![];
    // Include `-h/--help` and `--version` everywhere.
    let mut flags = vec![Help::USAGE, Version::USAGE];
    for t in targets.iter() {
        for &u in t.usage() {
            if u.flag { flags.push(u) } else { args.push(u) }
        }
    }
    // Arguments stay in the order they're given, since that's the order
    // positional arguments are expected in.
    flags.sort_by_key(|u| {
        u.format.split_once(", ").map(|(_, long)| long).unwrap_or(u.format)
    });
    let (usage, args, flags) = if long {
        let usage = REMOVE_SNIP_MARKERS.replace_all(usage, "");
        (usage, Usage::long(&args), Usage::long(&flags))
    } else {
        let usage = REMOVE_SNIPS.replace_all(usage, "");
        (usage, Usage::short(&args), Usage::short(&flags))
    };
    let usage = usage.replace("%args%", &args).replace("%flags%", &flags);
    Help(usage.trim().to_string())
}

/// Returns the next argument in `p` as a command name.
///
/// When there are no arguments left, the usage is returned as an error.
/// `-h/--help` and `--version` are returned as `Help` and `Version` errors.
pub fn next_as_command(usage: &str, p: &mut Parser) -> anyhow::Result<String> {
    let usage = usage.trim();
    let arg = match p.next()? {
        Some(arg) => arg,
        None => anyhow::bail!("{}", usage),
    };
    let cmd = match arg {
        Arg::Value(cmd) => cmd.string()?,
        Arg::Short('h') | Arg::Long("help") => {
            return Err(Help(usage.to_string()).into());
        }
        Arg::Long("version") => return Err(Version.into()),
        arg => return Err(arg.unexpected().into()),
    };
    Ok(cmd)
}

/// Parses the next `p.value()` into `T`. Errors mention `flag_name`.
pub fn parse<T>(p: &mut Parser, flag_name: &'static str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: Display + Debug + Send + Sync + 'static,
{
    // `anyhow::Error` doesn't implement `std::error::Error`, so errors
    // from `T` are converted through `anyhow::Error::msg`.
    let osv = p.value().context(flag_name)?;
    let Some(strv) = osv.to_str() else {
        let err = lexopt::Error::NonUnicodeValue(osv.into());
        return Err(anyhow::Error::from(err).context(flag_name));
    };
    strv.parse().map_err(|err| anyhow::Error::msg(err).context(flag_name))
}

/// The docs for one flag or argument.
///
/// `Usage::short` and `Usage::long` render a list of these as a table or as
/// wrapped paragraphs.
#[derive(Clone, Copy, Debug)]
pub struct Usage {
    /// Whether this is docs for a flag (optional) or an argument (required).
    pub flag: bool,
    /// How the flag is written, e.g., `-c, --count <number>`.
    pub format: &'static str,
    /// A one line description.
    pub short: &'static str,
    /// A description of any length. Paragraphs are separated by blank
    /// lines.
    pub long: &'static str,
}

impl Usage {
    pub const fn flag(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag: true, format, short, long }
    }

    pub const fn arg(
        format: &'static str,
        short: &'static str,
        long: &'static str,
    ) -> Usage {
        Usage { flag: false, format, short, long }
    }

    /// Formats a two column table of each format and its short
    /// description.
    pub fn short(usages: &[Usage]) -> String {
        const MIN_SPACE: usize = 2;

        let mut result = String::new();
        let Some(max_len) = usages.iter().map(|u| u.format.len()).max() else {
            return result;
        };
        for usage in usages.iter() {
            let padlen = MIN_SPACE + (max_len - usage.format.len());
            let padding = " ".repeat(padlen);
            writeln!(result, "    {}{}{}", usage.format, padding, usage.short)
                .unwrap();
        }
        result
    }

    /// Formats each format followed by its long description, indented and
    /// wrapped below it.
    pub fn long(usages: &[Usage]) -> String {
        let wrap_opts = textwrap::Options::new(79)
            .initial_indent("        ")
            .subsequent_indent("        ");
        let mut result = String::new();
        for (i, usage) in usages.iter().enumerate() {
            if i > 0 {
                result.push('\n');
            }
            writeln!(result, "    {}", usage.format).unwrap();
            for (i, paragraph) in usage.long.trim().split("\n\n").enumerate() {
                if i > 0 {
                    result.push('\n');
                }
                let flattened = paragraph.replace("\n", " ");
                for line in textwrap::wrap(&flattened, &wrap_opts) {
                    result.push_str(&line);
                    result.push('\n');
                }
            }
        }
        result
    }
}

/// The output of `-h/--help`, carried as an error.
///
/// `main` sniffs it out via downcasting and prints it to stdout with a
/// success exit code.
#[derive(Debug)]
pub struct Help(String);

impl Help {
    const USAGE: Usage = Usage::flag(
        "-h/--help",
        "Print help output.",
        r#"
Print help output.

The short flag, -h, prints condensed help output with one line per flag. The
long flag, --help, prints complete documentation, including examples.
"#,
    );
}

impl std::fmt::Display for Help {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Help {}

/// The output of `--version`, carried as an error in the same way as `Help`.
#[derive(Debug)]
pub struct Version;

impl Version {
    const USAGE: Usage = Usage::flag(
        "--version",
        "Print the version of freq.",
        r#"
Print the version of freq.
"#,
    );
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let semver = option_env!("CARGO_PKG_VERSION").unwrap_or("N/A");
        match option_env!("FREQ_BUILD_GIT_HASH") {
            None => write!(f, "freq {semver}"),
            Some(hash) => write!(f, "freq {semver} (rev {hash})"),
        }
    }
}

impl std::error::Error for Version {}
