use crate::{error::Error, unit::Unit};

/// What a rule requires of its unit.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum RuleValue {
    /// The unit must have exactly this value.
    Fixed(i64),
    /// The named predicate must accept the unit's value.
    Predicate(String),
}

impl RuleValue {
    /// Returns the fixed value, if this is a fixed rule.
    pub fn fixed(&self) -> Option<i64> {
        match *self {
            RuleValue::Fixed(value) => Some(value),
            RuleValue::Predicate(_) => None,
        }
    }

    /// Returns the predicate name, if this is a predicate rule.
    pub fn predicate(&self) -> Option<&str> {
        match *self {
            RuleValue::Fixed(_) => None,
            RuleValue::Predicate(ref name) => Some(name),
        }
    }
}

impl From<i64> for RuleValue {
    fn from(value: i64) -> RuleValue {
        RuleValue::Fixed(value)
    }
}

impl From<i32> for RuleValue {
    fn from(value: i32) -> RuleValue {
        RuleValue::Fixed(i64::from(value))
    }
}

impl From<&str> for RuleValue {
    fn from(name: &str) -> RuleValue {
        RuleValue::Predicate(name.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(name: String) -> RuleValue {
        RuleValue::Predicate(name)
    }
}

impl std::fmt::Display for RuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            RuleValue::Fixed(value) => write!(f, "{value}"),
            RuleValue::Predicate(ref name) => write!(f, "({name})"),
        }
    }
}

/// A single constraint on a unit measured within a scope.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Rule {
    unit: Unit,
    scope: Unit,
    value: RuleValue,
}

impl Rule {
    /// Create a new rule.
    ///
    /// A missing or illegal scope is replaced by the unit's default scope.
    /// This returns an error when `unit` is `Epoch` (which can't be
    /// constrained) or when a fixed value is given for a year.
    pub fn new(
        unit: Unit,
        scope: Option<Unit>,
        value: impl Into<RuleValue>,
    ) -> Result<Rule, Error> {
        if unit == Unit::Epoch {
            return Err(Error::invalid_unit(unit.name()));
        }
        let value = value.into();
        if unit == Unit::Year && value.fixed().is_some() {
            return Err(Error::FixedYear);
        }
        let scope = unit.normalize_scope(scope);
        Ok(Rule { unit, scope, value })
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn scope(&self) -> Unit {
        self.scope
    }

    pub fn value(&self) -> &RuleValue {
        &self.value
    }

    /// Returns true when this rule's scope is its unit's default scope.
    pub fn has_default_scope(&self) -> bool {
        self.scope == self.unit.default_scope()
    }

    /// The canonical position of this rule in a rule set.
    fn key(&self) -> (Unit, usize) {
        (self.unit, self.unit.scope_rank(self.scope))
    }
}

/// An ordered set of rules with at most one rule per unit and scope.
///
/// Rules are kept in canonical order: coarsest unit first, and for rules on
/// the same unit, in the order of that unit's legal scopes. Both notation
/// output and the matching engine rely on this order.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> RuleSet {
        RuleSet::default()
    }

    /// Insert a rule, replacing any existing rule on the same unit and
    /// scope. The replaced rule is returned.
    pub fn insert(&mut self, rule: Rule) -> Option<Rule> {
        match self.rules.binary_search_by_key(&rule.key(), |r| r.key()) {
            Ok(i) => Some(std::mem::replace(&mut self.rules[i], rule)),
            Err(i) => {
                self.rules.insert(i, rule);
                None
            }
        }
    }

    /// Returns the rule for `unit` within `scope`, if one exists.
    pub fn get(&self, unit: Unit, scope: Unit) -> Option<&Rule> {
        self.of(unit).iter().find(|r| r.scope == scope)
    }

    /// Returns every rule on `unit`, in scope order.
    pub fn of(&self, unit: Unit) -> &[Rule] {
        let start = self.rules.partition_point(|r| r.unit < unit);
        let end = self.rules.partition_point(|r| r.unit <= unit);
        &self.rules[start..end]
    }

    /// Returns true when at least one rule on `unit` has a fixed value.
    pub fn is_fixed(&self, unit: Unit) -> bool {
        self.of(unit).iter().any(|r| r.value.fixed().is_some())
    }

    /// Returns every unit carrying at least one rule, coarsest first.
    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        Unit::ORDER.into_iter().filter(|&u| !self.of(u).is_empty())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type IntoIter = std::slice::Iter<'a, Rule>;
    type Item = &'a Rule;

    fn into_iter(self) -> std::slice::Iter<'a, Rule> {
        self.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(it: I) -> RuleSet {
        let mut set = RuleSet::new();
        for rule in it {
            set.insert(rule);
        }
        set
    }
}

/// The structured form of a frequency: a list of unit, scope and value
/// entries.
///
/// Nothing is validated until the map is turned into a `Frequency`. Later
/// entries for the same unit and scope override earlier ones.
///
/// A map can be deserialized from data shaped like this:
///
/// ```json
/// {"hour": 10, "minute": 0, "day": {"week": 3}, "week": "odd"}
/// ```
///
/// Keys are unit names. Values are either an integer (a fixed rule), a string
/// (a predicate name) or a map from scope names to either of those. Scope
/// names that aren't legal scopes for a unit become the unit's default scope.
#[derive(Clone, Debug, Default)]
pub struct RuleMap {
    entries: Vec<(Unit, Option<Unit>, RuleValue)>,
}

impl RuleMap {
    pub fn new() -> RuleMap {
        RuleMap::default()
    }

    /// Add an entry to this map.
    pub fn insert(
        &mut self,
        unit: Unit,
        scope: Option<Unit>,
        value: impl Into<RuleValue>,
    ) -> &mut RuleMap {
        self.entries.push((unit, scope, value.into()));
        self
    }

    /// Converts every entry into a rule.
    pub fn to_rules(&self) -> Result<RuleSet, Error> {
        self.entries
            .iter()
            .map(|(unit, scope, value)| {
                Rule::new(*unit, *scope, value.clone())
            })
            .collect()
    }
}

impl<'de> serde::Deserialize<'de> for RuleValue {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<RuleValue, D::Error> {
        deserializer.deserialize_any(RuleValueVisitor)
    }
}

struct RuleValueVisitor;

impl<'de> serde::de::Visitor<'de> for RuleValueVisitor {
    type Value = RuleValue;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an integer or a predicate name")
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<RuleValue, E> {
        Ok(RuleValue::Fixed(v))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<RuleValue, E> {
        let v = i64::try_from(v).map_err(|_| {
            E::custom(format_args!("rule value `{v}` is too big"))
        })?;
        Ok(RuleValue::Fixed(v))
    }

    fn visit_str<E: serde::de::Error>(
        self,
        v: &str,
    ) -> Result<RuleValue, E> {
        Ok(RuleValue::Predicate(v.to_string()))
    }
}

// We write this out by hand since a unit's value can be a bare value or a
// nested map keyed by scope names, which doesn't fit a derived impl.
impl<'de> serde::Deserialize<'de> for RuleMap {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<RuleMap, D::Error> {
        use serde::de;

        /// A value for one unit: either a bare value (default scope) or a
        /// map of scope name to value.
        enum Scoped {
            Bare(RuleValue),
            Scopes(Vec<(Option<Unit>, RuleValue)>),
        }

        struct ScopedVisitor;

        impl<'de> de::Visitor<'de> for ScopedVisitor {
            type Value = Scoped;

            fn expecting(
                &self,
                f: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                f.write_str(
                    "an integer, a predicate name or a map from scope \
                     to either of those",
                )
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scoped, E> {
                de::Visitor::visit_i64(RuleValueVisitor, v)
                    .map(Scoped::Bare)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scoped, E> {
                de::Visitor::visit_u64(RuleValueVisitor, v)
                    .map(Scoped::Bare)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scoped, E> {
                de::Visitor::visit_str(RuleValueVisitor, v)
                    .map(Scoped::Bare)
            }

            fn visit_map<V>(self, mut map: V) -> Result<Scoped, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut scopes = vec![];
                while let Some((name, value)) =
                    map.next_entry::<String, RuleValue>()?
                {
                    let scope = name.parse::<Unit>().ok();
                    if scope.is_none() {
                        log::debug!(
                            "unrecognized scope `{name}`, \
                             using the default scope instead",
                        );
                    }
                    scopes.push((scope, value));
                }
                Ok(Scoped::Scopes(scopes))
            }
        }

        impl<'de> de::Deserialize<'de> for Scoped {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Scoped, D::Error> {
                deserializer.deserialize_any(ScopedVisitor)
            }
        }

        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = RuleMap;

            fn expecting(
                &self,
                f: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                f.write_str("a map from unit names to rule values")
            }

            fn visit_map<V>(self, mut map: V) -> Result<RuleMap, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut rules = RuleMap::new();
                while let Some((name, scoped)) =
                    map.next_entry::<String, Scoped>()?
                {
                    let unit =
                        name.parse::<Unit>().map_err(de::Error::custom)?;
                    match scoped {
                        Scoped::Bare(value) => {
                            rules.insert(unit, None, value);
                        }
                        Scoped::Scopes(scopes) => {
                            for (scope, value) in scopes {
                                rules.insert(unit, scope, value);
                            }
                        }
                    }
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        unit: Unit,
        scope: Option<Unit>,
        value: impl Into<RuleValue>,
    ) -> Rule {
        Rule::new(unit, scope, value).unwrap()
    }

    fn dump(set: &RuleSet) -> String {
        let lines: Vec<String> = set
            .iter()
            .map(|r| format!("{}/{}={}", r.unit(), r.scope(), r.value()))
            .collect();
        lines.join("\n")
    }

    #[test]
    fn scope_normalization() {
        let r = rule(Unit::Day, None, 3);
        assert_eq!(r.scope(), Unit::Month);
        assert!(r.has_default_scope());

        let r = rule(Unit::Day, Some(Unit::Week), 3);
        assert_eq!(r.scope(), Unit::Week);
        assert!(!r.has_default_scope());

        // Illegal scopes are silently replaced by the default.
        let r = rule(Unit::Month, Some(Unit::Day), 3);
        assert_eq!(r.scope(), Unit::Year);
    }

    #[test]
    fn rejected_rules() {
        insta::assert_snapshot!(
            Rule::new(Unit::Epoch, None, 1).unwrap_err(),
            @"invalid unit `epoch`",
        );
        insta::assert_snapshot!(
            Rule::new(Unit::Year, None, 2014).unwrap_err(),
            @"a year can only be constrained by a predicate, not a fixed value",
        );
        assert!(Rule::new(Unit::Year, None, "leap").is_ok());
    }

    #[test]
    fn values() {
        assert_eq!(RuleValue::from(5).fixed(), Some(5));
        assert_eq!(RuleValue::from("odd").predicate(), Some("odd"));
        assert_eq!(RuleValue::from(5).to_string(), "5");
        assert_eq!(RuleValue::from("odd").to_string(), "(odd)");
    }

    #[test]
    fn canonical_order() {
        let set: RuleSet = [
            rule(Unit::Second, None, 0),
            rule(Unit::Day, Some(Unit::Epoch), 5),
            rule(Unit::Day, Some(Unit::Week), 2),
            rule(Unit::Month, None, "odd"),
            rule(Unit::Day, None, 15),
        ]
        .into_iter()
        .collect();
        insta::assert_snapshot!(dump(&set), @r"
        month/year=(odd)
        day/month=15
        day/week=2
        day/epoch=5
        second/minute=0
        ");
        assert_eq!(set.of(Unit::Day).len(), 3);
        assert!(set.of(Unit::Hour).is_empty());
        assert_eq!(
            set.units().collect::<Vec<_>>(),
            vec![Unit::Month, Unit::Day, Unit::Second],
        );
        assert!(set.is_fixed(Unit::Day));
        assert!(!set.is_fixed(Unit::Month));
    }

    #[test]
    fn insert_replaces() {
        let mut set = RuleSet::new();
        assert!(set.insert(rule(Unit::Hour, None, 10)).is_none());
        let old = set.insert(rule(Unit::Hour, Some(Unit::Day), 11)).unwrap();
        assert_eq!(old.value(), &RuleValue::Fixed(10));
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(Unit::Hour, Unit::Day).unwrap().value(),
            &RuleValue::Fixed(11),
        );
        assert!(set.get(Unit::Hour, Unit::Week).is_none());
    }

    #[test]
    fn deserialize_map() {
        let map: RuleMap = serde_json::from_str(
            r#"{
                "hour": 10,
                "m": 0,
                "day": {"week": 3, "month": "odd", "nonsense": 4},
                "week": "even"
            }"#,
        )
        .unwrap();
        // The unrecognized scope name falls back to day within month, and
        // since it comes later, it overrides the `odd` predicate.
        insta::assert_snapshot!(dump(&map.to_rules().unwrap()), @r"
        week/year=(even)
        day/month=4
        day/week=3
        hour/day=10
        minute/hour=0
        ");
    }

    #[test]
    fn deserialize_errors() {
        let err = serde_json::from_str::<RuleMap>(r#"{"fortnight": 1}"#)
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("invalid unit `fortnight`"), "{err}");

        let err = serde_json::from_str::<RuleMap>(r#"{"hour": 1.5}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("expected an integer, a predicate"), "{err}");

        // Validation is deferred until the rules are built.
        let map: RuleMap =
            serde_json::from_str(r#"{"year": 2014}"#).unwrap();
        insta::assert_snapshot!(
            map.to_rules().unwrap_err(),
            @"a year can only be constrained by a predicate, not a fixed value",
        );
    }
}
