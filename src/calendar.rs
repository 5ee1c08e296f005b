use jiff::{
    RoundMode, Span, Timestamp, Zoned, ZonedRound,
    civil::{self, DateTimeRound},
    tz::TimeZone,
};

use crate::{error::Error, unit::Unit};

/// The first day of the epoch scope.
const EPOCH: civil::Date = civil::date(0, 1, 1);

/// The number of days from `EPOCH` to the first Monday of the epoch. Epoch
/// relative weeks are counted from that Monday.
const EPOCH_FIRST_MONDAY: i64 = 2;

const SECONDS_PER_DAY: i64 = 86_400;

/// The calendar arithmetic a frequency is evaluated with.
///
/// A calendar knows how to measure a unit within a scope for one of its
/// dates, and how to move a date forward or backward by a number of units.
/// The frequency engine never touches a date except through these methods.
pub trait Calendar {
    /// The date type this calendar operates on. Ordering on dates must be
    /// chronological.
    type Date: Clone + Ord + std::fmt::Debug;

    /// Returns the value of `unit` measured within `scope` for `date`.
    ///
    /// Combinations that a calendar can't measure return
    /// `Error::UnsupportedUnitScope`.
    fn read(
        &self,
        date: &Self::Date,
        unit: Unit,
        scope: Unit,
    ) -> Result<i64, Error>;

    /// Adds `count` (possibly negative) of `unit` to `date`.
    fn shift(
        &self,
        date: &Self::Date,
        unit: Unit,
        count: i64,
    ) -> Result<Self::Date, Error>;

    /// Returns the current date.
    fn now(&self) -> Self::Date;

    /// Returns the wall clock time of `date`. This is what predicates see.
    fn wall_clock(&self, date: &Self::Date) -> civil::DateTime;

    /// Drops everything more precise than a second from `date`.
    fn truncate(&self, date: &Self::Date) -> Result<Self::Date, Error>;
}

/// A calendar over civil datetimes, i.e., with no time zone at all.
///
/// Every day has exactly 24 hours.
#[derive(Clone, Copy, Debug, Default)]
pub struct CivilCalendar;

impl CivilCalendar {
    pub fn new() -> CivilCalendar {
        CivilCalendar
    }
}

impl Calendar for CivilCalendar {
    type Date = civil::DateTime;

    fn read(
        &self,
        date: &civil::DateTime,
        unit: Unit,
        scope: Unit,
    ) -> Result<i64, Error> {
        read_wall_clock(*date, unit, scope)
    }

    fn shift(
        &self,
        date: &civil::DateTime,
        unit: Unit,
        count: i64,
    ) -> Result<civil::DateTime, Error> {
        Ok(date.checked_add(span(unit, count)?)?)
    }

    fn now(&self) -> civil::DateTime {
        Zoned::now().datetime()
    }

    fn wall_clock(&self, date: &civil::DateTime) -> civil::DateTime {
        *date
    }

    fn truncate(
        &self,
        date: &civil::DateTime,
    ) -> Result<civil::DateTime, Error> {
        let round = DateTimeRound::new()
            .smallest(jiff::Unit::Second)
            .mode(RoundMode::Trunc);
        Ok(date.round(round)?)
    }
}

/// A calendar over zoned datetimes in a particular time zone.
///
/// Values are always read from the wall clock. Shifting by years, months,
/// weeks or days is calendar arithmetic that preserves the wall clock time
/// (when possible), while shifting by hours, minutes or seconds adds exact
/// elapsed time. This means adding an hour across a daylight saving time
/// transition can move the wall clock by zero or two hours.
///
/// Since values come from the wall clock, a wall clock time that repeats
/// when the clocks fall back is only seen once. For example, a frequency
/// for 01:30 searched from 01:45 EDT on 2014-11-02 in New York finds 01:30
/// on the next day, not the 01:30 EST that follows an hour later.
#[derive(Clone, Debug)]
pub struct ZonedCalendar {
    tz: TimeZone,
}

impl ZonedCalendar {
    /// Create a calendar for the given time zone.
    pub fn new(tz: TimeZone) -> ZonedCalendar {
        ZonedCalendar { tz }
    }

    /// Create a calendar for the system's configured time zone.
    pub fn system() -> ZonedCalendar {
        ZonedCalendar::new(TimeZone::system())
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.tz
    }
}

impl Calendar for ZonedCalendar {
    type Date = Zoned;

    fn read(
        &self,
        date: &Zoned,
        unit: Unit,
        scope: Unit,
    ) -> Result<i64, Error> {
        read_wall_clock(date.datetime(), unit, scope)
    }

    fn shift(
        &self,
        date: &Zoned,
        unit: Unit,
        count: i64,
    ) -> Result<Zoned, Error> {
        Ok(date.checked_add(span(unit, count)?)?)
    }

    fn now(&self) -> Zoned {
        Timestamp::now().to_zoned(self.tz.clone())
    }

    fn wall_clock(&self, date: &Zoned) -> civil::DateTime {
        date.datetime()
    }

    fn truncate(&self, date: &Zoned) -> Result<Zoned, Error> {
        let round = ZonedRound::new()
            .smallest(jiff::Unit::Second)
            .mode(RoundMode::Trunc);
        Ok(date.round(round)?)
    }
}

/// Builds a span of `count` units.
fn span(unit: Unit, count: i64) -> Result<Span, Error> {
    let span = Span::new();
    Ok(match unit {
        Unit::Year => span.try_years(count)?,
        Unit::Month => span.try_months(count)?,
        Unit::Week => span.try_weeks(count)?,
        Unit::Day => span.try_days(count)?,
        Unit::Hour => span.try_hours(count)?,
        Unit::Minute => span.try_minutes(count)?,
        Unit::Second => span.try_seconds(count)?,
        Unit::Epoch => return Err(Error::unsupported(unit, unit)),
    })
}

/// Measures `unit` within `scope` on a wall clock datetime.
///
/// Time units are measured as whole units elapsed since the start of the
/// enclosing scope, so an hour within a week runs from 0 (Monday at
/// midnight) to 167.
fn read_wall_clock(
    dt: civil::DateTime,
    unit: Unit,
    scope: Unit,
) -> Result<i64, Error> {
    use self::Unit::*;

    if !unit.is_legal_scope(scope) {
        return Err(Error::unsupported(unit, scope));
    }
    let value = match (unit, scope) {
        (Year, Epoch) => i64::from(dt.year()),
        (Month, Year) => i64::from(dt.month()),
        (Week, Year) => i64::from(dt.date().iso_week_date().week()),
        (Week, Epoch) => {
            (days_since_epoch(dt.date()) - EPOCH_FIRST_MONDAY).div_euclid(7)
        }
        (Day, Month) => i64::from(dt.day()),
        (Day, Year) => i64::from(dt.day_of_year()),
        (Day, Week) => i64::from(dt.weekday().to_monday_one_offset()),
        (Day, Epoch) => days_since_epoch(dt.date()),
        (Hour | Minute | Second, _) => {
            let per_unit = match unit {
                Hour => 3_600,
                Minute => 60,
                _ => 1,
            };
            seconds_into(dt, scope).div_euclid(per_unit)
        }
        _ => return Err(Error::unsupported(unit, scope)),
    };
    Ok(value)
}

/// Returns the number of seconds elapsed between the start of the `scope`
/// period containing `dt` and `dt`.
fn seconds_into(dt: civil::DateTime, scope: Unit) -> i64 {
    let minute = i64::from(dt.second());
    let hour = i64::from(dt.minute()) * 60 + minute;
    let day = i64::from(dt.hour()) * 3_600 + hour;
    let days_before = match scope {
        Unit::Second => return 0,
        Unit::Minute => return minute,
        Unit::Hour => return hour,
        Unit::Day => return day,
        Unit::Week => i64::from(dt.weekday().to_monday_zero_offset()),
        Unit::Month => i64::from(dt.day()) - 1,
        Unit::Year => i64::from(dt.day_of_year()) - 1,
        Unit::Epoch => days_since_epoch(dt.date()),
    };
    days_before * SECONDS_PER_DAY + day
}

fn days_since_epoch(date: civil::Date) -> i64 {
    date.duration_since(EPOCH).as_secs().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn civil(s: &str) -> civil::DateTime {
        s.parse().unwrap()
    }

    fn zoned(s: &str) -> Zoned {
        s.parse().unwrap()
    }

    fn new_york() -> ZonedCalendar {
        ZonedCalendar::new(TimeZone::get("America/New_York").unwrap())
    }

    fn read(s: &str, unit: Unit, scope: Unit) -> i64 {
        CivilCalendar.read(&civil(s), unit, scope).unwrap()
    }

    #[test]
    fn read_dates() {
        assert_eq!(read("2013-09-02T11:10:20", Unit::Year, Unit::Epoch), 2013);
        assert_eq!(read("2013-09-02T11:10:20", Unit::Month, Unit::Year), 9);
        assert_eq!(read("2013-09-02T11:10:20", Unit::Day, Unit::Month), 2);
        assert_eq!(read("2013-09-02T11:10:20", Unit::Day, Unit::Week), 1);
        assert_eq!(read("2013-09-08T00:00:00", Unit::Day, Unit::Week), 7);
        assert_eq!(read("2016-12-31T00:00:00", Unit::Day, Unit::Year), 366);
        assert_eq!(read("0000-01-01T00:00:00", Unit::Day, Unit::Epoch), 0);
        assert_eq!(read("0000-01-02T00:00:00", Unit::Day, Unit::Epoch), 1);
    }

    #[test]
    fn read_weeks() {
        assert_eq!(read("2018-07-01T00:00:00", Unit::Week, Unit::Year), 26);
        assert_eq!(read("2021-01-01T00:00:00", Unit::Week, Unit::Year), 53);
        assert_eq!(read("2015-04-29T00:00:00", Unit::Week, Unit::Year), 18);
        assert_eq!(read("2015-05-04T00:00:00", Unit::Week, Unit::Year), 19);

        // Weeks since the epoch roll over on Mondays.
        let sunday = read("2015-05-03T23:59:59", Unit::Week, Unit::Epoch);
        let monday = read("2015-05-04T00:00:00", Unit::Week, Unit::Epoch);
        assert_eq!(monday, sunday + 1);
        assert_eq!(read("0000-01-03T00:00:00", Unit::Week, Unit::Epoch), 0);
        assert_eq!(read("0000-01-02T00:00:00", Unit::Week, Unit::Epoch), -1);
    }

    #[test]
    fn read_times() {
        let dt = "2015-05-15T03:25:40";
        assert_eq!(read(dt, Unit::Hour, Unit::Day), 3);
        assert_eq!(read(dt, Unit::Minute, Unit::Hour), 25);
        assert_eq!(read(dt, Unit::Second, Unit::Minute), 40);
        assert_eq!(read(dt, Unit::Minute, Unit::Day), 3 * 60 + 25);
        assert_eq!(read(dt, Unit::Second, Unit::Hour), 25 * 60 + 40);
        // 2015-05-15 is a Friday.
        assert_eq!(read(dt, Unit::Hour, Unit::Week), 4 * 24 + 3);
        assert_eq!(read(dt, Unit::Hour, Unit::Month), 14 * 24 + 3);
        assert_eq!(read(dt, Unit::Hour, Unit::Year), (135 - 1) * 24 + 3);
    }

    #[test]
    fn read_unsupported() {
        let cal = CivilCalendar;
        let dt = civil("2015-05-15T03:25:40");
        insta::assert_snapshot!(
            cal.read(&dt, Unit::Month, Unit::Epoch).unwrap_err(),
            @"cannot measure month within epoch",
        );
        insta::assert_snapshot!(
            cal.read(&dt, Unit::Week, Unit::Month).unwrap_err(),
            @"cannot measure week within month",
        );
        insta::assert_snapshot!(
            cal.read(&dt, Unit::Day, Unit::Hour).unwrap_err(),
            @"cannot measure day within hour",
        );
    }

    #[test]
    fn shift_civil() {
        let cal = CivilCalendar;
        let dt = civil("2013-01-31T10:00:00");
        insta::assert_snapshot!(
            cal.shift(&dt, Unit::Month, 1).unwrap(),
            @"2013-02-28T10:00:00",
        );
        insta::assert_snapshot!(
            cal.shift(&dt, Unit::Week, -1).unwrap(),
            @"2013-01-24T10:00:00",
        );
        insta::assert_snapshot!(
            cal.shift(&dt, Unit::Hour, 15).unwrap(),
            @"2013-02-01T01:00:00",
        );
        insta::assert_snapshot!(
            cal.shift(&dt, Unit::Second, -1).unwrap(),
            @"2013-01-31T09:59:59",
        );
        assert!(cal.shift(&dt, Unit::Year, 100_000).is_err());
    }

    #[test]
    fn shift_zoned_across_dst() {
        let cal = new_york();
        let zdt = zoned("2014-03-09T00:00:00[America/New_York]");
        insta::assert_snapshot!(
            cal.shift(&zdt, Unit::Hour, 2).unwrap(),
            @"2014-03-09T03:00:00-04:00[America/New_York]",
        );
        insta::assert_snapshot!(
            cal.shift(&zdt, Unit::Day, 1).unwrap(),
            @"2014-03-10T00:00:00-04:00[America/New_York]",
        );
        let zdt = cal.shift(&zdt, Unit::Hour, 2).unwrap();
        assert_eq!(cal.read(&zdt, Unit::Hour, Unit::Day).unwrap(), 3);
    }

    #[test]
    fn truncate() {
        insta::assert_snapshot!(
            CivilCalendar.truncate(&civil("2013-09-02T11:10:20.75")).unwrap(),
            @"2013-09-02T11:10:20",
        );
        let cal = new_york();
        insta::assert_snapshot!(
            cal.truncate(&zoned("2013-09-02T11:10:20.5[America/New_York]"))
                .unwrap(),
            @"2013-09-02T11:10:20-04:00[America/New_York]",
        );
    }
}
