/*!
A library for finding datetimes that satisfy a set of calendar constraints.

A [`Frequency`] is a set of rules, each constraining one calendar unit (a
year, month, week, day, hour, minute or second) measured within a containing
scope. For example, "the day within the week is 1" means Mondays and "the
hour within the day is 15" means 3pm. A rule either requires a fixed value or
names a [`Predicate`] that accepts or rejects values.

Given a reference datetime, [`Frequency::next`] finds the earliest datetime
on or after it that satisfies every rule, and [`Frequency::between`] lists
every match in a range. All arithmetic goes through a [`Calendar`], with
[`CivilCalendar`] and [`ZonedCalendar`] provided on top of Jiff.

Frequencies have a compact textual [`notation`]:

```
use date_frequency::{CivilCalendar, Frequency, Predicates};

let freq = Frequency::parse("F3D/WT10H0M0S", &Predicates::new())?;
let cal = CivilCalendar::new();
let start = jiff::civil::date(2013, 9, 2).at(11, 10, 20, 0);
// Wednesdays at 10am.
assert_eq!(freq.next(&cal, &start)?.to_string(), "2013-09-04T10:00:00");

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub use crate::{
    calendar::{Calendar, CivilCalendar, ZonedCalendar},
    error::Error,
    frequency::Frequency,
    predicate::{Predicate, Predicates},
    rule::{Rule, RuleMap, RuleSet, RuleValue},
    search::Between,
    unit::Unit,
};

mod calendar;
mod error;
mod frequency;
pub mod notation;
pub mod predicate;
mod rule;
mod search;
mod unit;
