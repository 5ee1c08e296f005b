use {
    anyhow::Context,
    bstr::{BStr, ByteSlice},
    date_frequency::{Frequency, RuleMap, RuleValue},
};

use crate::{
    CAL, PREDICATES,
    args::Usage,
    datetime::DateTime,
    parse::{BytesExt, FromBytes},
};

/// A frequency parsed from user input.
///
/// Input is either in frequency notation, like `F1D/WT15H0M0S`, or a JSON
/// rule map, like `{"day": {"week": 1}, "hour": 15}`. Frequencies may name
/// any of the predicates `freq` registers: `odd`, `even`, `leap` and
/// `weekend`.
#[derive(Clone, Debug)]
pub struct Recurrence {
    freq: Frequency,
}

impl Recurrence {
    pub const ARG: Usage = Usage::arg(
        "<frequency>",
        "A frequency, e.g., `F1D/WT15H0M0S` for Mondays at 15:00.",
        FREQUENCY_DOCS,
    );

    pub const ARG_OR_STDIN: Usage = Usage::arg(
        "<frequency>",
        "One or more frequencies, e.g., `F1D/WT15H0M0S`.",
        r#"
One or more frequencies.

Frequencies can either be passed as positional arguments or as line delimited
data on stdin, but not both. That is, frequencies are only read from stdin
when none are given as positional arguments.

See `freq next --help` for the accepted formats.
"#,
    );

    pub fn get(&self) -> &Frequency {
        &self.freq
    }

    /// Returns the earliest match at or after `dt`.
    pub fn next(&self, dt: &DateTime) -> anyhow::Result<DateTime> {
        self.freq
            .next(&*CAL, dt.get())
            .with_context(|| format!("failed to find `{self}` from {dt}"))
            .map(DateTime::from)
    }

    /// Calls `f` with every match in `[next(start), end)` until it returns
    /// `false`.
    pub fn between(
        &self,
        start: &DateTime,
        end: &DateTime,
        mut f: impl FnMut(DateTime) -> anyhow::Result<bool>,
    ) -> anyhow::Result<()> {
        for result in self.freq.between(&*CAL, start.get(), end.get()) {
            let zdt = result.with_context(|| {
                format!("failed to find `{self}` between {start} and {end}")
            })?;
            if !f(DateTime::from(zdt))? {
                break;
            }
        }
        Ok(())
    }

    /// Returns a JSON description of every rule in this frequency.
    pub fn to_json(&self) -> serde_json::Value {
        let rules: Vec<serde_json::Value> = self
            .freq
            .rules()
            .iter()
            .map(|rule| {
                let value = match *rule.value() {
                    RuleValue::Fixed(n) => serde_json::json!(n),
                    RuleValue::Predicate(ref name) => serde_json::json!(name),
                };
                serde_json::json!({
                    "unit": rule.unit().name(),
                    "scope": rule.scope().name(),
                    "value": value,
                })
            })
            .collect();
        serde_json::json!({
            "frequency": self.freq.to_string(),
            "rules": rules,
        })
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.freq, f)
    }
}

impl std::str::FromStr for Recurrence {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Recurrence> {
        s.as_bytes().parse()
    }
}

impl FromBytes for Recurrence {
    type Err = anyhow::Error;

    fn from_bytes(s: &[u8]) -> anyhow::Result<Recurrence> {
        let s = s.trim_ascii();
        let freq = if s.starts_with(b"{") {
            let map: RuleMap = serde_json::from_slice(s).with_context(|| {
                format!("invalid JSON rule map `{}`", BStr::new(s))
            })?;
            Frequency::from_map(&map, &PREDICATES)?
        } else {
            let s = s.to_str().with_context(|| {
                format!("frequency `{}` is not valid UTF-8", BStr::new(s))
            })?;
            Frequency::parse(s, &PREDICATES)?
        };
        Ok(Recurrence { freq })
    }
}

const FREQUENCY_DOCS: &str = r#"
A frequency.

A frequency is a set of rules, each requiring a unit of the calendar to have a
certain value within a containing scope. A datetime matches a frequency when it
satisfies every rule. Units that have no rule can take any value.

In frequency notation, a frequency starts with `F`. Then come the rules for
years (`Y`), months (`M`), weeks (`W`) and days (`D`), followed by `T` and the
rules for hours (`H`), minutes (`M`) and seconds (`S`). Units must be given
from coarsest to finest. Each rule is a value, the unit letter and optionally
`/` and a scope: `E` (epoch), `Y`, `M`, `W`, `D`, `h` (hour) or `m` (minute).
When no scope is given, each unit is measured within the next coarser unit,
except for weeks and days, which are measured within the year and the month.

For example, `F1D/WT15H0M0S` is Mondays at 15:00:00, `F10D` is the tenth day
of every month and `F100D/Y` is the hundredth day of every year.

A value can also be a predicate in parentheses, like `F(odd)W1D/W`, which
matches Mondays of odd weeks. The predicates `odd`, `even`, `leap` (for
leap years) and `weekend` (for day of week values) are available.

A frequency may also be given as a JSON object keyed by unit name, like
`{"day": {"week": 1}, "hour": 15}`. A value is a number, a predicate name, or
an object keyed by scope name.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notation_and_json() {
        let freq: Recurrence = "F1D/WT15H".parse().unwrap();
        assert_eq!(freq.to_string(), "F1D/WT15H");

        let freq: Recurrence =
            r#" {"day": {"week": 1}, "hour": 15} "#.parse().unwrap();
        assert_eq!(freq.to_string(), "F1D/WT15H");

        let freq: Recurrence = r#"{"week": "odd"}"#.parse().unwrap();
        assert_eq!(freq.to_string(), "F(odd)W");
    }

    #[test]
    fn invalid() {
        let err = |s: &str| s.parse::<Recurrence>().unwrap_err().to_string();

        insta::assert_snapshot!(
            err("F(prime)D"),
            @"predicate `prime` is not registered",
        );
        insta::assert_snapshot!(
            err("F1D/WT"),
            @"malformed frequency `F1D/WT`: `T` must be followed by a time",
        );
        insta::assert_snapshot!(
            err(r#"{"day": 1"#),
            @r#"invalid JSON rule map `{"day": 1`"#,
        );
    }

    #[test]
    fn json() {
        let freq: Recurrence = "F(odd)W1D/WT15H".parse().unwrap();
        insta::assert_snapshot!(
            freq.to_json().to_string(),
            @r#"{"frequency":"F(odd)W1D/WT15H","rules":[{"scope":"year","unit":"week","value":"odd"},{"scope":"week","unit":"day","value":1},{"scope":"day","unit":"hour","value":15}]}"#,
        );
    }
}
