use crate::unit::Unit;

/// An error that can occur when building or evaluating a frequency.
///
/// Construction errors (`InvalidUnit`, `MalformedFrequency`,
/// `UnknownPredicate` and `FixedYear`) are always reported before any
/// matching is attempted. The remaining variants can only come out of
/// `Frequency::next` and `Frequency::between`.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A unit name or code that isn't recognized, or `Epoch` used as the
    /// unit of a rule.
    InvalidUnit { name: String },
    /// A notation string that doesn't follow the frequency grammar.
    MalformedFrequency { notation: String, reason: String },
    /// A predicate rule names a predicate absent from the registry.
    UnknownPredicate { name: String },
    /// The calendar can't measure `unit` within `scope`.
    UnsupportedUnitScope { unit: Unit, scope: Unit },
    /// No datetime satisfying the rules could be found. `unit` is the unit
    /// that couldn't be satisfied and `attempts` is how many times it was
    /// advanced before giving up.
    NoMatchFound { unit: Unit, attempts: usize },
    /// A fixed value was given for the year, which has no containing unit
    /// to carry into.
    FixedYear,
    /// Calendar arithmetic overflowed the supported range.
    Arithmetic(jiff::Error),
}

impl Error {
    pub(crate) fn invalid_unit(name: impl Into<String>) -> Error {
        Error::InvalidUnit { name: name.into() }
    }

    pub(crate) fn malformed(
        notation: &str,
        reason: impl Into<String>,
    ) -> Error {
        Error::MalformedFrequency {
            notation: notation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_predicate(name: &str) -> Error {
        Error::UnknownPredicate { name: name.to_string() }
    }

    pub(crate) fn unsupported(unit: Unit, scope: Unit) -> Error {
        Error::UnsupportedUnitScope { unit, scope }
    }

    pub(crate) fn no_match(unit: Unit, attempts: usize) -> Error {
        Error::NoMatchFound { unit, attempts }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::InvalidUnit { ref name } => {
                write!(f, "invalid unit `{name}`")
            }
            Error::MalformedFrequency { ref notation, ref reason } => {
                write!(f, "malformed frequency `{notation}`: {reason}")
            }
            Error::UnknownPredicate { ref name } => {
                write!(f, "predicate `{name}` is not registered")
            }
            Error::UnsupportedUnitScope { unit, scope } => {
                write!(f, "cannot measure {unit} within {scope}")
            }
            Error::NoMatchFound { unit, attempts } => write!(
                f,
                "no matching datetime found: gave up on {unit} \
                 after {attempts} attempts",
            ),
            Error::FixedYear => f.write_str(
                "a year can only be constrained by a predicate, \
                 not a fixed value",
            ),
            Error::Arithmetic(_) => f.write_str("calendar arithmetic failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Arithmetic(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<jiff::Error> for Error {
    fn from(err: jiff::Error) -> Error {
        Error::Arithmetic(err)
    }
}
