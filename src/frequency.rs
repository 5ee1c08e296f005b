use std::{cmp::Ordering, sync::Arc};

use crate::{
    calendar::Calendar,
    error::Error,
    notation,
    predicate::Predicates,
    rule::{Rule, RuleMap, RuleSet, RuleValue},
    search::{Between, Search},
    unit::Unit,
};

/// A set of calendar constraints, and the datetimes satisfying all of them.
///
/// A frequency is immutable. Adding a rule with [`Frequency::on`] returns a
/// new frequency and leaves the original untouched, so frequencies can be
/// shared freely across threads.
///
/// Every frequency holds on to the predicate registry it was built with.
/// Every predicate named by its rules is guaranteed to be registered there.
///
/// # Example
///
/// ```
/// use date_frequency::{CivilCalendar, Frequency, Predicates, predicate};
///
/// let predicates = Predicates::new().with("odd", predicate::odd);
/// // Mondays of odd weeks at 15:45:00.
/// let freq = Frequency::parse("F(odd)W1D/WT15H45M0S", &predicates)?;
/// let start = jiff::civil::date(2015, 4, 29).at(0, 0, 0, 0);
/// let next = freq.next(&CivilCalendar::new(), &start)?;
/// assert_eq!(next.to_string(), "2015-05-04T15:45:00");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Frequency {
    rules: Arc<RuleSet>,
    predicates: Predicates,
}

impl Frequency {
    /// Create a frequency without any rules. It matches every second.
    pub fn new(predicates: &Predicates) -> Frequency {
        Frequency {
            rules: Arc::new(RuleSet::new()),
            predicates: predicates.clone(),
        }
    }

    /// Parse a frequency from its notation.
    ///
    /// See the [`notation`] module for the syntax.
    pub fn parse(
        notation: &str,
        predicates: &Predicates,
    ) -> Result<Frequency, Error> {
        Frequency::build(notation::parse(notation)?, predicates)
    }

    /// Build a frequency from the structured form of its rules.
    pub fn from_map(
        map: &RuleMap,
        predicates: &Predicates,
    ) -> Result<Frequency, Error> {
        Frequency::build(map.to_rules()?, predicates)
    }

    /// Build a frequency from individual rules. When two rules share a unit
    /// and scope, the later one wins.
    pub fn from_rules(
        rules: impl IntoIterator<Item = Rule>,
        predicates: &Predicates,
    ) -> Result<Frequency, Error> {
        Frequency::build(rules.into_iter().collect(), predicates)
    }

    fn build(
        rules: RuleSet,
        predicates: &Predicates,
    ) -> Result<Frequency, Error> {
        for rule in &rules {
            check_predicate(rule, predicates)?;
        }
        let predicates = predicates.clone();
        Ok(Frequency { rules: Arc::new(rules), predicates })
    }

    /// Returns a new frequency with an additional rule on `unit` within
    /// `scope`, replacing any rule already there.
    ///
    /// When `scope` is `None` (or not a legal scope for `unit`), the unit's
    /// default scope is used.
    pub fn on(
        &self,
        unit: Unit,
        value: impl Into<RuleValue>,
        scope: Option<Unit>,
    ) -> Result<Frequency, Error> {
        let rule = Rule::new(unit, scope, value)?;
        check_predicate(&rule, &self.predicates)?;
        let mut rules = RuleSet::clone(&self.rules);
        rules.insert(rule);
        Ok(Frequency {
            rules: Arc::new(rules),
            predicates: self.predicates.clone(),
        })
    }

    /// Returns the value required of `unit` within `scope`, if any.
    pub fn get_value(
        &self,
        unit: Unit,
        scope: Option<Unit>,
    ) -> Option<&RuleValue> {
        let scope = unit.normalize_scope(scope);
        self.rules.get(unit, scope).map(|rule| rule.value())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    /// Returns the earliest datetime on or after `date` that satisfies every
    /// rule of this frequency.
    ///
    /// Precision finer than a second is ignored when matching. If `date`
    /// itself matches, it is returned as is.
    pub fn next<C: Calendar>(
        &self,
        cal: &C,
        date: &C::Date,
    ) -> Result<C::Date, Error> {
        self.search(cal).next(date)
    }

    /// Like `next`, but starting from the calendar's current time.
    pub fn next_from_now<C: Calendar>(
        &self,
        cal: &C,
    ) -> Result<C::Date, Error> {
        self.next(cal, &cal.now())
    }

    /// Returns an iterator over every match from `next(start)` up to, but
    /// not including, `end`.
    pub fn between<'a, C: Calendar>(
        &'a self,
        cal: &'a C,
        start: &C::Date,
        end: &C::Date,
    ) -> Between<'a, C> {
        Between::new(self.search(cal), start, end)
    }

    /// Returns true when `date` satisfies every rule of this frequency.
    pub fn matches<C: Calendar>(
        &self,
        cal: &C,
        date: &C::Date,
    ) -> Result<bool, Error> {
        Ok(self.search(cal).violation(date)?.is_none())
    }

    /// Orders frequencies from least to most constrained.
    ///
    /// Units are compared from coarsest to finest. A frequency without any
    /// rule on a unit sorts before one with a rule on it. When both have
    /// fixed values for the same unit and scope, the smaller value sorts
    /// first. Predicates only count for being present, so two frequencies
    /// that differ only in which predicates they name compare equal.
    pub fn compare(&self, other: &Frequency) -> Ordering {
        for unit in Unit::ORDER {
            let (mine, theirs) = (self.rules.of(unit), other.rules.of(unit));
            match (mine.is_empty(), theirs.is_empty()) {
                (true, true) => continue,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => {}
            }
            for rule in mine {
                let Some(their) = other.rules.get(unit, rule.scope()) else {
                    continue;
                };
                let (Some(a), Some(b)) =
                    (rule.value().fixed(), their.value().fixed())
                else {
                    continue;
                };
                match a.cmp(&b) {
                    Ordering::Equal => {}
                    ordering => return ordering,
                }
            }
        }
        Ordering::Equal
    }

    fn search<'a, C: Calendar>(&'a self, cal: &'a C) -> Search<'a, C> {
        Search::new(cal, &self.rules, &self.predicates)
    }
}

fn check_predicate(
    rule: &Rule,
    predicates: &Predicates,
) -> Result<(), Error> {
    match rule.value().predicate() {
        Some(name) if !predicates.contains(name) => {
            Err(Error::unknown_predicate(name))
        }
        _ => Ok(()),
    }
}

impl PartialEq for Frequency {
    fn eq(&self, other: &Frequency) -> bool {
        self.rules == other.rules
    }
}

impl Eq for Frequency {}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&notation::serialize(&self.rules))
    }
}

impl serde::Serialize for Frequency {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
