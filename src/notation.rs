/*!
The compact frequency notation.

A frequency is written as `F`, followed by groups for the date units (years,
months, weeks and days), optionally followed by `T` and groups for the time
units (hours, minutes and seconds). Each group is a value, a unit letter and
an optional `/` followed by a scope code:

```text
F(odd)W1D/WT15H45M0S
```

reads as "Mondays of odd weeks, at 15:45:00". A value is either a decimal
integer or a predicate name in parentheses. Note that `M` is a month before
the `T` and a minute after it.

Units must appear from coarsest to finest. A unit may appear more than once
as long as every occurrence has a different scope.

Not every legal scope can be evaluated. Weeks within a month (`F2W/M`)
parse and serialize fine, but neither calendar in this crate can measure
them, so searching such a frequency always fails with
[`Error::UnsupportedUnitScope`](crate::Error::UnsupportedUnitScope).
*/

use crate::{
    error::Error,
    rule::{Rule, RuleSet, RuleValue},
    unit::Unit,
};

/// Parse a frequency written in notation into its rules.
pub fn parse(notation: &str) -> Result<RuleSet, Error> {
    Parser { notation, pos: 0 }.parse()
}

/// Write the given rules out in notation.
///
/// Rules are written in canonical order and scopes are only written when
/// they differ from a unit's default scope. The empty rule set is `F`.
pub fn serialize(rules: &RuleSet) -> String {
    let mut out = String::from("F");
    let mut wrote_time = false;
    for rule in rules {
        if rule.unit().is_time() && !wrote_time {
            out.push('T');
            wrote_time = true;
        }
        out.push_str(&rule.value().to_string());
        out.push(letter(rule.unit()));
        if !rule.has_default_scope() {
            out.push('/');
            out.push(rule.scope().code());
        }
    }
    out
}

/// The letter a unit is written with in a group.
fn letter(unit: Unit) -> char {
    match unit {
        Unit::Epoch => 'E',
        Unit::Year => 'Y',
        Unit::Month | Unit::Minute => 'M',
        Unit::Week => 'W',
        Unit::Day => 'D',
        Unit::Hour => 'H',
        Unit::Second => 'S',
    }
}

struct Parser<'a> {
    notation: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse(&mut self) -> Result<RuleSet, Error> {
        if !self.eat('F') {
            return Err(self.error("must start with `F`"));
        }
        let mut rules = RuleSet::new();
        let mut last = Unit::Epoch;
        while !self.is_done() && self.peek() != Some('T') {
            self.group(false, &mut last, &mut rules)?;
        }
        if self.eat('T') {
            if self.is_done() {
                return Err(self.error("`T` must be followed by a time"));
            }
            while !self.is_done() {
                self.group(true, &mut last, &mut rules)?;
            }
        }
        Ok(rules)
    }

    /// Parse one `<value><letter>[/<scope>]` group and add it to `rules`.
    fn group(
        &mut self,
        time: bool,
        last: &mut Unit,
        rules: &mut RuleSet,
    ) -> Result<(), Error> {
        let value = self.value()?;
        let unit = self.unit(time)?;
        if unit < *last {
            return Err(self.error(format!(
                "{unit} must come before {last}",
                last = *last,
            )));
        }
        *last = unit;

        let scope = if self.eat('/') {
            let scope = self.scope()?;
            if !unit.is_legal_scope(scope) {
                return Err(self.error(format!(
                    "{unit} cannot be measured within {scope}",
                )));
            }
            scope
        } else {
            unit.default_scope()
        };
        if rules.get(unit, scope).is_some() {
            return Err(self.error(format!(
                "{unit} within {scope} is given more than once",
            )));
        }
        let rule = Rule::new(unit, Some(scope), value)
            .map_err(|err| self.error(err.to_string()))?;
        rules.insert(rule);
        Ok(())
    }

    fn value(&mut self) -> Result<RuleValue, Error> {
        if self.eat('(') {
            let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            if name.is_empty() {
                return Err(self.error("expected a predicate name"));
            }
            if !self.eat(')') {
                return Err(self.error("expected `)` after predicate name"));
            }
            return Ok(RuleValue::Predicate(name.to_string()));
        }
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.error("expected a number or a predicate"));
        }
        let value = digits.parse::<i64>().map_err(|_| {
            self.error(format!("value `{digits}` is too big"))
        })?;
        Ok(RuleValue::Fixed(value))
    }

    fn unit(&mut self, time: bool) -> Result<Unit, Error> {
        let unit = match (time, self.peek()) {
            (false, Some('Y')) => Unit::Year,
            (false, Some('M')) => Unit::Month,
            (false, Some('W')) => Unit::Week,
            (false, Some('D')) => Unit::Day,
            (true, Some('H')) => Unit::Hour,
            (true, Some('M')) => Unit::Minute,
            (true, Some('S')) => Unit::Second,
            (false, Some('H' | 'S')) => {
                return Err(self.error("time units must come after `T`"));
            }
            (true, Some('Y' | 'W' | 'D')) => {
                return Err(self.error("date units must come before `T`"));
            }
            (_, Some(c)) => {
                return Err(self.error(format!("unrecognized unit `{c}`")));
            }
            (_, None) => return Err(self.error("expected a unit")),
        };
        self.pos += 1;
        Ok(unit)
    }

    fn scope(&mut self) -> Result<Unit, Error> {
        let scope = match self.peek() {
            Some('E') => Unit::Epoch,
            Some('Y') => Unit::Year,
            Some('M') => Unit::Month,
            Some('W') => Unit::Week,
            Some('D') => Unit::Day,
            Some('h' | 'H') => Unit::Hour,
            Some('m') => Unit::Minute,
            Some(c) => {
                return Err(self.error(format!("unrecognized scope `{c}`")));
            }
            None => return Err(self.error("expected a scope after `/`")),
        };
        self.pos += 1;
        Ok(scope)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let notation = self.notation;
        let rest = &notation[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(_, c)| !predicate(c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        &rest[..len]
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.notation[self.pos..].chars().next()
    }

    fn is_done(&self) -> bool {
        self.pos >= self.notation.len()
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        let reason = reason.into();
        let reason = if self.is_done() {
            reason
        } else {
            format!("{reason} at offset {}", self.pos)
        };
        Error::malformed(self.notation, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(notation: &str) -> String {
        serialize(&parse(notation).unwrap())
    }

    #[test]
    fn roundtrips() {
        for notation in [
            "F",
            "FT15H45M",
            "F1D/WT15H45M",
            "F1D/WT15H45M0S",
            "F(leap)Y1D/WT15H45M0S",
            "F(odd)W1D/WT15H45M0S",
            "F(inThirdWeek)W3D/WT10H0M0S",
            "F2M",
            "F10W/M",
            "F15D1D/W",
            "FT10H/W30M/D",
            "F100D/Y5D/E",
        ] {
            assert_eq!(roundtrip(notation), notation);
        }
    }

    #[test]
    fn canonicalization() {
        // Default scopes are dropped and lowercase scope codes are
        // accepted for hours.
        assert_eq!(roundtrip("F3M/Y"), "F3M");
        assert_eq!(roundtrip("FT10H/D"), "FT10H");
        assert_eq!(roundtrip("FT10M/H"), "FT10M");
        assert_eq!(roundtrip("FT10S/H"), "FT10S/h");
        assert_eq!(roundtrip("FT10S/m"), "FT10S");
        // Rules on one unit are written in scope order.
        assert_eq!(roundtrip("F1D/W15D"), "F15D1D/W");
    }

    #[test]
    fn parsed_rules() {
        let rules = parse("F(odd)W1D/WT15H45M0S").unwrap();
        let got: Vec<String> = rules
            .iter()
            .map(|r| format!("{}/{}={}", r.unit(), r.scope(), r.value()))
            .collect();
        insta::assert_snapshot!(got.join("\n"), @r"
        week/year=(odd)
        day/week=1
        hour/day=15
        minute/hour=45
        second/minute=0
        ");
    }

    #[test]
    fn malformed() {
        let err = |notation: &str| parse(notation).unwrap_err().to_string();

        insta::assert_snapshot!(
            err(""),
            @"malformed frequency ``: must start with `F`",
        );
        insta::assert_snapshot!(
            err("F9H"),
            @"malformed frequency `F9H`: time units must come after `T` at offset 2",
        );
        insta::assert_snapshot!(
            err("FT6D"),
            @"malformed frequency `FT6D`: date units must come before `T` at offset 3",
        );
        insta::assert_snapshot!(
            err("FT"),
            @"malformed frequency `FT`: `T` must be followed by a time",
        );
        insta::assert_snapshot!(
            err("F1D2M"),
            @"malformed frequency `F1D2M`: month must come before day",
        );
        insta::assert_snapshot!(
            err("F1D1D"),
            @"malformed frequency `F1D1D`: day within month is given more than once",
        );
        insta::assert_snapshot!(
            err("F1M/W"),
            @"malformed frequency `F1M/W`: month cannot be measured within week",
        );
        insta::assert_snapshot!(
            err("F1D/X"),
            @"malformed frequency `F1D/X`: unrecognized scope `X` at offset 4",
        );
        insta::assert_snapshot!(
            err("F2014Y"),
            @"malformed frequency `F2014Y`: a year can only be constrained by a predicate, not a fixed value",
        );
        insta::assert_snapshot!(
            err("F()D"),
            @"malformed frequency `F()D`: expected a predicate name at offset 2",
        );
        insta::assert_snapshot!(
            err("F(odd-ish)D"),
            @"malformed frequency `F(odd-ish)D`: expected `)` after predicate name at offset 5",
        );
        insta::assert_snapshot!(
            err("F99999999999999999999D"),
            @"malformed frequency `F99999999999999999999D`: value `99999999999999999999` is too big at offset 21",
        );
        insta::assert_snapshot!(
            err("F1"),
            @"malformed frequency `F1`: expected a unit",
        );
        insta::assert_snapshot!(
            err("FT1H "),
            @"malformed frequency `FT1H `: expected a number or a predicate at offset 4",
        );
        insta::assert_snapshot!(
            err("fT1H"),
            @"malformed frequency `fT1H`: must start with `F` at offset 0",
        );
    }
}
