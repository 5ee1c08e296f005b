use crate::{
    calendar::Calendar,
    error::Error,
    notation,
    predicate::Predicates,
    rule::{RuleSet, RuleValue},
    unit::Unit,
};

/// The maximum number of passes over the rules before giving up.
///
/// One pass almost always suffices. More are needed when the calendar clamps
/// a date (e.g., moving from January 30 to February) and a value that was
/// satisfied earlier in the pass no longer is.
pub(crate) const MAX_PASSES: usize = 64;

/// The maximum number of times a single unit is advanced while looking for a
/// value that a predicate accepts.
pub(crate) const MAX_PREDICATE_ATTEMPTS: usize = 10_000;

/// A search for datetimes satisfying a set of rules on some calendar.
pub(crate) struct Search<'a, C> {
    cal: &'a C,
    rules: &'a RuleSet,
    predicates: &'a Predicates,
}

impl<'a, C: Calendar> Search<'a, C> {
    pub(crate) fn new(
        cal: &'a C,
        rules: &'a RuleSet,
        predicates: &'a Predicates,
    ) -> Search<'a, C> {
        Search { cal, rules, predicates }
    }

    /// Returns the earliest datetime on or after `reference` satisfying
    /// every rule.
    pub(crate) fn next(&self, reference: &C::Date) -> Result<C::Date, Error> {
        log::debug!(
            "searching for {} on or after {reference:?}",
            notation::serialize(self.rules),
        );
        let mut date = self.cal.truncate(reference)?;
        let mut failing = Unit::Year;
        for pass in 1..=MAX_PASSES {
            date = self.pass(date)?;
            match self.violation(&date)? {
                None => {
                    // Only possible when truncation dropped fractional
                    // seconds from a reference that already matched.
                    if date < *reference {
                        date = reference.clone();
                    }
                    log::debug!("found {date:?} after {pass} pass(es)");
                    return Ok(date);
                }
                Some(unit) => {
                    log::trace!(
                        "pass {pass} ended on {date:?} with {unit} \
                         unsatisfied, repairing",
                    );
                    failing = unit;
                }
            }
        }
        Err(Error::no_match(failing, MAX_PASSES))
    }

    /// Returns the first unit (coarsest first) whose rules `date` fails.
    pub(crate) fn violation(
        &self,
        date: &C::Date,
    ) -> Result<Option<Unit>, Error> {
        for rule in self.rules {
            let value = self.cal.read(date, rule.unit(), rule.scope())?;
            let ok = match *rule.value() {
                RuleValue::Fixed(target) => value == target,
                RuleValue::Predicate(ref name) => {
                    self.predicate(name)?
                        .evaluate(value, &self.cal.wall_clock(date))
                }
            };
            if !ok {
                return Ok(Some(rule.unit()));
            }
        }
        Ok(None)
    }

    /// Visits every rule once, coarsest unit first, moving `date` forward
    /// until each rule is satisfied in turn.
    fn pass(&self, mut date: C::Date) -> Result<C::Date, Error> {
        for unit in self.rules.units() {
            for rule in self.rules.of(unit) {
                let scope = rule.scope();
                date = match *rule.value() {
                    RuleValue::Fixed(target) => {
                        self.fix(date, unit, scope, target)?
                    }
                    RuleValue::Predicate(ref name) => {
                        let (date, moved) =
                            self.filter(date, unit, scope, name)?;
                        if moved {
                            self.reset_below(date, unit, unit)?
                        } else {
                            date
                        }
                    }
                };
            }
        }
        Ok(date)
    }

    /// Moves `date` forward to the first time `unit` within `scope` is equal
    /// to `target`.
    fn fix(
        &self,
        date: C::Date,
        unit: Unit,
        scope: Unit,
        target: i64,
    ) -> Result<C::Date, Error> {
        let current = self.cal.read(&date, unit, scope)?;
        match current.cmp(&target) {
            std::cmp::Ordering::Equal => Ok(date),
            std::cmp::Ordering::Less => {
                log::trace!(
                    "raising {unit} within {scope} from {current} to {target}",
                );
                let delta = target.saturating_sub(current);
                let date = self.cal.shift(&date, unit, delta)?;
                self.reset_below(date, unit, unit)
            }
            std::cmp::Ordering::Greater => {
                self.carry(date, unit, scope, target)
            }
        }
    }

    /// Handles a fixed rule whose target has already passed within its
    /// scope, by moving into the next period of the free parent and setting
    /// `unit` to `target` there.
    fn carry(
        &self,
        date: C::Date,
        unit: Unit,
        scope: Unit,
        target: i64,
    ) -> Result<C::Date, Error> {
        let parent = self.free_parent(unit, scope);
        if parent == Unit::Epoch {
            // Epochs never repeat, so a passed value is gone for good.
            return Err(Error::no_match(unit, 1));
        }
        log::trace!(
            "{unit} within {scope} is past {target}, \
             carrying into the next {parent}",
        );
        let mut date = self.cal.shift(&date, parent, 1)?;
        for rule in self.rules.of(parent) {
            if let RuleValue::Predicate(ref name) = *rule.value() {
                date = self.filter(date, parent, rule.scope(), name)?.0;
            }
        }
        for &between in Unit::between(parent, unit) {
            if !self.rules.is_fixed(between) {
                date = self.reset_default(date, between, parent)?;
            }
        }
        match unit.reset_value() {
            Some(reset) => {
                date = self.reset(date, unit, scope, reset)?;
                date = self.reset_below(date, unit, unit)?;
                self.cal.shift(&date, unit, target.saturating_sub(reset))
            }
            None => {
                // Weeks have no first value to reset to. The first week of
                // a year may even be numbered 52 or 53, so step forward until
                // the value is no longer past the target.
                date = self.reset_below(date, unit, parent)?;
                let mut attempts = 0;
                while self.cal.read(&date, unit, scope)? > target {
                    if attempts == MAX_PREDICATE_ATTEMPTS {
                        return Err(Error::no_match(unit, attempts));
                    }
                    attempts += 1;
                    date = self.cal.shift(&date, unit, 1)?;
                }
                let current = self.cal.read(&date, unit, scope)?;
                date = self.cal.shift(
                    &date,
                    unit,
                    target.saturating_sub(current),
                )?;
                self.reset_below(date, unit, unit)
            }
        }
    }

    /// Returns the unit to advance when `unit` within `scope` is past its
    /// target.
    ///
    /// This is the finest scope in play, among `unit` and the units coarser
    /// than it, that is no finer than `scope` and carries no fixed rule. It
    /// is `Epoch` when there is no such unit.
    fn free_parent(&self, unit: Unit, scope: Unit) -> Unit {
        let mut parent = Unit::Epoch;
        let mut consider = |candidate: Unit| {
            if candidate <= scope && !self.rules.is_fixed(candidate) {
                parent = candidate;
            }
        };
        for &u in Unit::ORDER.iter().take_while(|&&u| u <= unit) {
            let rules = self.rules.of(u);
            if rules.is_empty() {
                consider(u.default_scope());
            }
            for rule in rules {
                consider(rule.scope());
            }
        }
        parent
    }

    /// Advances `unit` one at a time until the named predicate accepts its
    /// value within `scope`. Also returns whether `date` moved at all.
    fn filter(
        &self,
        mut date: C::Date,
        unit: Unit,
        scope: Unit,
        name: &str,
    ) -> Result<(C::Date, bool), Error> {
        let predicate = self.predicate(name)?;
        let mut attempts = 0;
        loop {
            let value = self.cal.read(&date, unit, scope)?;
            if predicate.evaluate(value, &self.cal.wall_clock(&date)) {
                return Ok((date, attempts > 0));
            }
            if attempts == MAX_PREDICATE_ATTEMPTS {
                return Err(Error::no_match(unit, attempts));
            }
            log::trace!(
                "predicate `{name}` rejected {unit} {value} within {scope}",
            );
            attempts += 1;
            date = self.cal.shift(&date, unit, 1)?;
        }
    }

    /// Resets every unit finer than `unit` to its first value.
    ///
    /// Each unit is measured within its default scope, unless that scope is
    /// coarser than `limit`, in which case it is measured within `limit`.
    fn reset_below(
        &self,
        mut date: C::Date,
        unit: Unit,
        limit: Unit,
    ) -> Result<C::Date, Error> {
        for &lower in unit.lower() {
            date = self.reset_default(date, lower, limit)?;
        }
        Ok(date)
    }

    fn reset_default(
        &self,
        date: C::Date,
        unit: Unit,
        limit: Unit,
    ) -> Result<C::Date, Error> {
        let Some(value) = unit.reset_value() else { return Ok(date) };
        let scope = unit.default_scope().max(limit);
        self.reset(date, unit, scope, value)
    }

    /// Sets `unit` within `scope` to `value`.
    fn reset(
        &self,
        date: C::Date,
        unit: Unit,
        scope: Unit,
        value: i64,
    ) -> Result<C::Date, Error> {
        let current = self.cal.read(&date, unit, scope)?;
        if current == value {
            return Ok(date);
        }
        self.cal.shift(&date, unit, value.saturating_sub(current))
    }

    fn predicate(
        &self,
        name: &str,
    ) -> Result<&'a dyn crate::predicate::Predicate, Error> {
        self.predicates
            .get(name)
            .ok_or_else(|| Error::unknown_predicate(name))
    }
}

/// An iterator over every match of a frequency within a range.
///
/// This is created by `Frequency::between`. It yields matches in increasing
/// order and stops after the first error.
pub struct Between<'a, C: Calendar> {
    search: Search<'a, C>,
    /// Where to search from next. `None` once the range is exhausted.
    from: Option<Result<C::Date, Error>>,
    end: C::Date,
}

impl<'a, C: Calendar> Between<'a, C> {
    pub(crate) fn new(
        search: Search<'a, C>,
        start: &C::Date,
        end: &C::Date,
    ) -> Between<'a, C> {
        Between { search, from: Some(Ok(start.clone())), end: end.clone() }
    }
}

impl<'a, C: Calendar> Iterator for Between<'a, C> {
    type Item = Result<C::Date, Error>;

    fn next(&mut self) -> Option<Result<C::Date, Error>> {
        let from = match self.from.take()? {
            Ok(from) => from,
            Err(err) => return Some(Err(err)),
        };
        let date = match self.search.next(&from) {
            Ok(date) => date,
            Err(err) => return Some(Err(err)),
        };
        if date >= self.end {
            log::debug!("{date:?} is not before {:?}, stopping", self.end);
            return None;
        }
        self.from = Some(self.search.cal.shift(&date, Unit::Second, 1));
        Some(Ok(date))
    }
}

impl<'a, C: Calendar> std::iter::FusedIterator for Between<'a, C> {}

impl<'a, C: Calendar> std::fmt::Debug for Between<'a, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Between")
            .field("rules", &notation::serialize(self.search.rules))
            .field("from", &self.from)
            .field("end", &self.end)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil;

    use crate::{calendar::CivilCalendar, predicate, rule::Rule};

    use super::*;

    fn civil(s: &str) -> civil::DateTime {
        s.parse().unwrap()
    }

    fn next(rules: &RuleSet, start: &str) -> Result<civil::DateTime, Error> {
        let predicates = Predicates::new()
            .with("odd", predicate::odd)
            .with("weekend", predicate::weekend);
        Search::new(&CivilCalendar, rules, &predicates).next(&civil(start))
    }

    #[test]
    fn free_parent() {
        let none = Predicates::new();

        let rules = notation::parse("F3MT10H").unwrap();
        let search = Search::new(&CivilCalendar, &rules, &none);
        assert_eq!(search.free_parent(Unit::Hour, Unit::Day), Unit::Day);
        assert_eq!(search.free_parent(Unit::Month, Unit::Year), Unit::Year);

        let rules = notation::parse("F1D/WT15H").unwrap();
        let search = Search::new(&CivilCalendar, &rules, &none);
        assert_eq!(search.free_parent(Unit::Day, Unit::Week), Unit::Week);
        // Day carries a fixed rule, so an hour past its target carries into
        // the week instead.
        assert_eq!(search.free_parent(Unit::Hour, Unit::Day), Unit::Week);

        let rules = notation::parse("F5D/E").unwrap();
        let search = Search::new(&CivilCalendar, &rules, &none);
        assert_eq!(search.free_parent(Unit::Day, Unit::Epoch), Unit::Epoch);
    }

    #[test]
    fn reset_is_limited_to_the_changed_unit() {
        // The day is reset to the start of the week here, not to the first
        // of the month.
        let rules = notation::parse("FT10H/W").unwrap();
        let got = next(&rules, "2015-05-15T03:00").unwrap();
        assert_eq!(got, civil("2015-05-18T10:00"));
    }

    #[test]
    fn repair_pass_after_clamping() {
        // February has no 30th, so the first pass overshoots into March
        // and the second pass repairs it.
        let rules = notation::parse("F30D").unwrap();
        let got = next(&rules, "2013-01-31").unwrap();
        assert_eq!(got, civil("2013-03-30"));
    }

    #[test]
    fn fractional_seconds_are_kept_when_matching() {
        let rules = notation::parse("FT10H").unwrap();
        let got = next(&rules, "2013-09-02T10:15:00.5").unwrap();
        assert_eq!(got, civil("2013-09-02T10:15:00.5"));
        let got = next(&rules, "2013-09-02T09:15:00.5").unwrap();
        assert_eq!(got, civil("2013-09-02T10:00"));
    }

    #[test]
    fn exhausted() {
        let rules = notation::parse("F5D/E").unwrap();
        insta::assert_snapshot!(
            next(&rules, "2013-09-02").unwrap_err(),
            @"no matching datetime found: gave up on day after 1 attempts",
        );

        let rules: RuleSet = [Rule::new(Unit::Day, None, "never").unwrap()]
            .into_iter()
            .collect();
        let never = |_: i64, _: &civil::DateTime| false;
        let predicates = Predicates::new().with("never", never);
        let search = Search::new(&CivilCalendar, &rules, &predicates);
        insta::assert_snapshot!(
            search.next(&civil("2013-09-02")).unwrap_err(),
            @"no matching datetime found: gave up on day after 10000 attempts",
        );
    }

    #[test]
    fn unregistered_predicate() {
        let rules = notation::parse("F(missing)D").unwrap();
        insta::assert_snapshot!(
            next(&rules, "2013-09-02").unwrap_err(),
            @"predicate `missing` is not registered",
        );
    }

    #[test]
    fn violation() {
        let rules = notation::parse("F(odd)W1D/WT10H").unwrap();
        let predicates = Predicates::new().with("odd", predicate::odd);
        let search = Search::new(&CivilCalendar, &rules, &predicates);
        // 2015-05-04 is a Monday in week 19.
        let check = |s: &str| search.violation(&civil(s)).unwrap();
        assert_eq!(check("2015-05-04T10:00"), None);
        assert_eq!(check("2015-05-04T11:00"), Some(Unit::Hour));
        assert_eq!(check("2015-05-05T10:00"), Some(Unit::Day));
        assert_eq!(check("2015-05-11T10:00"), Some(Unit::Week));
    }
}
