use std::{collections::BTreeMap, sync::Arc};

use jiff::civil;

/// A named accept/reject test used in place of a fixed value in a rule.
///
/// The engine calls `evaluate` with the current value of the rule's unit
/// (measured within the rule's scope) and the wall clock time of the
/// candidate. Returning `false` makes the engine advance the unit by one and
/// try again.
///
/// Any `Fn(i64, &civil::DateTime) -> bool` closure or function is a
/// predicate.
pub trait Predicate: Send + Sync {
    fn evaluate(&self, value: i64, date: &civil::DateTime) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(i64, &civil::DateTime) -> bool + Send + Sync,
{
    fn evaluate(&self, value: i64, date: &civil::DateTime) -> bool {
        self(value, date)
    }
}

/// A registry of predicates, keyed by name.
///
/// A registry is created empty and filled in by the embedding application
/// before any frequency is built from it. Each frequency holds on to the
/// registry it was built with, so registering a predicate afterwards never
/// changes the behavior of an existing frequency.
///
/// Cloning a registry is cheap. Registering into a clone copies the
/// underlying map first, so other clones never observe the change.
#[derive(Clone, Default)]
pub struct Predicates {
    map: Arc<BTreeMap<String, Arc<dyn Predicate>>>,
}

impl Predicates {
    /// Create an empty registry.
    pub fn new() -> Predicates {
        Predicates::default()
    }

    /// Register `predicate` under `name`, replacing any predicate
    /// previously registered with that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        predicate: impl Predicate + 'static,
    ) -> &mut Predicates {
        Arc::make_mut(&mut self.map).insert(name.into(), Arc::new(predicate));
        self
    }

    /// Like `register`, but consumes and returns this registry.
    pub fn with(
        mut self,
        name: impl Into<String>,
        predicate: impl Predicate + 'static,
    ) -> Predicates {
        self.register(name, predicate);
        self
    }

    /// Returns the predicate registered under `name`, if one exists.
    pub fn get(&self, name: &str) -> Option<&dyn Predicate> {
        self.map.get(name).map(|p| &**p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Returns the names of all registered predicates in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|name| name.as_str())
    }
}

impl std::fmt::Debug for Predicates {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Accepts odd values.
pub fn odd(value: i64, _: &civil::DateTime) -> bool {
    value.rem_euclid(2) == 1
}

/// Accepts even values.
pub fn even(value: i64, _: &civil::DateTime) -> bool {
    value.rem_euclid(2) == 0
}

/// Accepts values that are leap years. Meant for rules on years.
pub fn leap_year(value: i64, _: &civil::DateTime) -> bool {
    (value % 4 == 0 && value % 100 != 0) || value % 400 == 0
}

/// Accepts Saturday and Sunday. Meant for rules on days within a week.
pub fn weekend(value: i64, _: &civil::DateTime) -> bool {
    value == 6 || value == 7
}
