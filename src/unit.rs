use crate::error::Error;

/// A calendar granularity.
///
/// Units are totally ordered from coarsest to finest, with the virtual
/// `Epoch` unit ordered before everything else. `Epoch` is only ever used as
/// a scope. It can never carry a rule of its own.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Unit {
    Epoch,
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

/// Every unit, including `Epoch`, coarsest first.
///
/// The slicing helpers below all index into this table.
const ALL: [Unit; 8] = [
    Unit::Epoch,
    Unit::Year,
    Unit::Month,
    Unit::Week,
    Unit::Day,
    Unit::Hour,
    Unit::Minute,
    Unit::Second,
];

impl Unit {
    /// The units that may carry rules, coarsest first.
    pub const ORDER: [Unit; 7] = [
        Unit::Year,
        Unit::Month,
        Unit::Week,
        Unit::Day,
        Unit::Hour,
        Unit::Minute,
        Unit::Second,
    ];

    /// Returns the single letter code for this unit.
    ///
    /// Note that month and minute are distinguished by case: `M` is a month
    /// and `m` is a minute.
    pub fn code(self) -> char {
        match self {
            Unit::Epoch => 'E',
            Unit::Year => 'Y',
            Unit::Month => 'M',
            Unit::Week => 'W',
            Unit::Day => 'D',
            Unit::Hour => 'h',
            Unit::Minute => 'm',
            Unit::Second => 's',
        }
    }

    /// Returns the long form name of this unit.
    pub fn name(self) -> &'static str {
        match self {
            Unit::Epoch => "epoch",
            Unit::Year => "year",
            Unit::Month => "month",
            Unit::Week => "week",
            Unit::Day => "day",
            Unit::Hour => "hour",
            Unit::Minute => "minute",
            Unit::Second => "second",
        }
    }

    /// Returns the scopes within which this unit's value may be measured.
    ///
    /// The first scope is always the default.
    pub fn legal_scopes(self) -> &'static [Unit] {
        use self::Unit::*;

        match self {
            Epoch => &[],
            Year => &[Epoch],
            Month => &[Year, Epoch],
            Week => &[Year, Month, Epoch],
            Day => &[Month, Year, Week, Epoch],
            Hour => &[Day, Week, Month, Year, Epoch],
            Minute => &[Hour, Day, Week, Month, Year, Epoch],
            Second => &[Minute, Hour, Day, Week, Month, Year, Epoch],
        }
    }

    /// Returns the scope used when none (or an illegal one) is given.
    pub fn default_scope(self) -> Unit {
        self.legal_scopes().first().copied().unwrap_or(Unit::Epoch)
    }

    /// Returns true when `scope` is one of this unit's legal scopes.
    pub fn is_legal_scope(self, scope: Unit) -> bool {
        self.legal_scopes().contains(&scope)
    }

    /// Resolves an optional scope for this unit.
    ///
    /// Missing and illegal scopes silently become the default scope.
    pub fn normalize_scope(self, scope: Option<Unit>) -> Unit {
        match scope {
            Some(scope) if self.is_legal_scope(scope) => scope,
            _ => self.default_scope(),
        }
    }

    /// Returns the position of `scope` among this unit's legal scopes.
    ///
    /// Illegal scopes sort after every legal one.
    pub(crate) fn scope_rank(self, scope: Unit) -> usize {
        self.legal_scopes()
            .iter()
            .position(|&s| s == scope)
            .unwrap_or(usize::MAX)
    }

    /// All units strictly finer than this one, coarsest first.
    pub fn lower(self) -> &'static [Unit] {
        &ALL[self.index() + 1..]
    }

    /// All constrainable units strictly coarser than this one, coarsest
    /// first. This never includes `Epoch`.
    pub fn higher(self) -> &'static [Unit] {
        match self {
            Unit::Epoch => &[],
            _ => &ALL[1..self.index()],
        }
    }

    /// All units strictly between `coarse` and `fine`.
    ///
    /// This is empty when `coarse` is not strictly coarser than `fine`.
    pub fn between(coarse: Unit, fine: Unit) -> &'static [Unit] {
        if coarse >= fine {
            return &[];
        }
        &ALL[coarse.index() + 1..fine.index()]
    }

    /// The value this unit is reset to when a coarser unit changes.
    ///
    /// Years and weeks have no natural default and are never reset.
    pub fn reset_value(self) -> Option<i64> {
        match self {
            Unit::Month | Unit::Day => Some(1),
            Unit::Hour | Unit::Minute | Unit::Second => Some(0),
            Unit::Epoch | Unit::Year | Unit::Week => None,
        }
    }

    /// Returns true for the units written after `T` in notation.
    pub fn is_time(self) -> bool {
        matches!(self, Unit::Hour | Unit::Minute | Unit::Second)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Unit, Error> {
        use self::Unit::*;

        // Codes are case sensitive, since `M` and `m` differ.
        let unit = match s {
            "E" => return Ok(Epoch),
            "Y" => return Ok(Year),
            "M" => return Ok(Month),
            "W" => return Ok(Week),
            "D" => return Ok(Day),
            "h" => return Ok(Hour),
            "m" => return Ok(Minute),
            "s" => return Ok(Second),
            _ => s.to_lowercase(),
        };
        Ok(match &*unit {
            "epoch" => Epoch,
            "year" | "years" | "yr" | "yrs" => Year,
            "month" | "months" | "mo" | "mos" => Month,
            "week" | "weeks" | "wk" | "wks" => Week,
            "day" | "days" => Day,
            "hour" | "hours" | "hr" | "hrs" => Hour,
            "minute" | "minutes" | "min" | "mins" => Minute,
            "second" | "seconds" | "sec" | "secs" => Second,
            _ => return Err(Error::invalid_unit(s)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(units: &[Unit]) -> String {
        units.iter().map(|u| u.code()).collect()
    }

    #[test]
    fn order() {
        assert_eq!(codes(&Unit::ORDER), "YMWDhms");
        assert!(Unit::Epoch < Unit::Year);
        assert!(Unit::Week < Unit::Day);
        assert!(Unit::Hour > Unit::Day);
    }

    #[test]
    fn scopes() {
        assert_eq!(codes(Unit::Year.legal_scopes()), "E");
        assert_eq!(codes(Unit::Day.legal_scopes()), "MYWE");
        assert_eq!(codes(Unit::Second.legal_scopes()), "mhDWMYE");
        for unit in Unit::ORDER {
            assert!(unit.is_legal_scope(Unit::Epoch), "{unit}");
            assert!(unit.default_scope() < unit, "{unit}");
        }

        assert_eq!(Unit::Day.normalize_scope(None), Unit::Month);
        assert_eq!(Unit::Day.normalize_scope(Some(Unit::Week)), Unit::Week);
        assert_eq!(Unit::Day.normalize_scope(Some(Unit::Hour)), Unit::Month);
        assert_eq!(Unit::Month.normalize_scope(Some(Unit::Week)), Unit::Year);
    }

    #[test]
    fn lower_higher_between() {
        assert_eq!(codes(Unit::Week.lower()), "Dhms");
        assert_eq!(codes(Unit::Second.lower()), "");
        assert_eq!(codes(Unit::Week.higher()), "YM");
        assert_eq!(codes(Unit::Year.higher()), "");
        assert_eq!(codes(Unit::Epoch.higher()), "");
        assert_eq!(codes(Unit::between(Unit::Year, Unit::Day)), "MW");
        assert_eq!(codes(Unit::between(Unit::Epoch, Unit::Month)), "Y");
        assert_eq!(codes(Unit::between(Unit::Day, Unit::Day)), "");
        assert_eq!(codes(Unit::between(Unit::Day, Unit::Year)), "");
    }

    #[test]
    fn parse() {
        assert_eq!("M".parse::<Unit>().unwrap(), Unit::Month);
        assert_eq!("m".parse::<Unit>().unwrap(), Unit::Minute);
        assert_eq!("day".parse::<Unit>().unwrap(), Unit::Day);
        assert_eq!("Hours".parse::<Unit>().unwrap(), Unit::Hour);
        assert_eq!("wk".parse::<Unit>().unwrap(), Unit::Week);
        assert_eq!("epoch".parse::<Unit>().unwrap(), Unit::Epoch);
        insta::assert_snapshot!(
            "fortnight".parse::<Unit>().unwrap_err(),
            @"invalid unit `fortnight`",
        );
        insta::assert_snapshot!(
            "H".parse::<Unit>().unwrap_err(),
            @"invalid unit `H`",
        );
    }

    #[test]
    fn reset_values() {
        assert_eq!(Unit::Month.reset_value(), Some(1));
        assert_eq!(Unit::Day.reset_value(), Some(1));
        assert_eq!(Unit::Minute.reset_value(), Some(0));
        assert_eq!(Unit::Year.reset_value(), None);
        assert_eq!(Unit::Week.reset_value(), None);
    }
}
