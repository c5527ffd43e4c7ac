use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::error::RequirementError;
use crate::version::Version;

/// Comparison operators supported by a [`Requirement`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    /// `~>`: at least the reference version, but below its optimistic bump
    Pessimistic,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Operator::Equal),
            "!=" => Some(Operator::NotEqual),
            ">" => Some(Operator::GreaterThan),
            "<" => Some(Operator::LessThan),
            ">=" => Some(Operator::GreaterThanOrEqual),
            "<=" => Some(Operator::LessThanOrEqual),
            "~>" => Some(Operator::Pessimistic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::Pessimistic => "~>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operator + reference version constraint.
///
/// The reference version is always normalized, but the number of numeric identifiers the
/// requirement was written with is remembered: `~> 2.1` allows everything below `3.0.0`,
/// whereas `~> 2.1.0` stops at `2.2.0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Requirement {
    operator: Operator,
    version: Version,
    precision: usize,
}

impl Requirement {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self::with_precision(operator, version, 3)
    }

    /// Only `~>` depends on the precision; every other operator is stored with full precision
    pub(crate) fn with_precision(operator: Operator, version: Version, precision: usize) -> Self {
        let precision = match operator {
            Operator::Pessimistic => precision.clamp(1, 3),
            _ => 3,
        };
        Self {
            operator,
            version,
            precision,
        }
    }

    /// Parses requirements such as `"1.0"`, `"!= 2.1.3"` or `"~> 2.1"`.
    ///
    /// A lone version implies the `=` operator.
    pub fn parse(input: &str) -> Result<Self, RequirementError> {
        let requirement = input.trim();
        let tokens = requirement.split_whitespace().collect::<Vec<_>>();
        let (operator, token) = match tokens.as_slice() {
            &[version] => ("=", version),
            &[operator, version] => (operator, version),
            _ => {
                return Err(RequirementError::MalformedVersion {
                    version: tokens.iter().skip(1).join(" "),
                    requirement: requirement.to_string(),
                })
            }
        };

        let operator =
            Operator::from_symbol(operator).ok_or_else(|| RequirementError::UnsupportedOperator {
                operator: operator.to_string(),
                requirement: requirement.to_string(),
            })?;

        let normalized = Version::normalize(token);
        let version =
            Version::parse(&normalized).map_err(|_| RequirementError::MalformedVersion {
                version: normalized.clone(),
                requirement: requirement.to_string(),
            })?;

        // Every padding step of `normalize` appends ".0"
        let padding = (normalized.len() - token.len()) / 2;

        Ok(Self::with_precision(operator, version, 3 - padding))
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_pre_release(&self) -> bool {
        self.version.is_pre_release()
    }

    pub fn satisfied_by(&self, candidate: &Version) -> bool {
        match self.operator {
            Operator::Equal => candidate == &self.version,
            Operator::NotEqual => candidate != &self.version,
            Operator::GreaterThan => candidate > &self.version,
            Operator::LessThan => candidate < &self.version,
            Operator::GreaterThanOrEqual => candidate >= &self.version,
            Operator::LessThanOrEqual => candidate <= &self.version,
            Operator::Pessimistic => {
                candidate >= &self.version
                    && self
                        .upper_bound()
                        .map_or(true, |bound| candidate.release_version() < bound)
            }
        }
    }

    /// The exclusive bound of `~>`: the last-but-one given identifier is incremented, or the
    /// only one if a single identifier was given. `None` when that identifier is already at its
    /// maximum, in which case nothing above the reference version is excluded.
    fn upper_bound(&self) -> Option<Version> {
        if self.precision >= 3 {
            self.version.optimistic_bump()
        } else {
            self.version.next_major()
        }
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator == Operator::Pessimistic && self.precision < 3 {
            let given = &self.version.number_component()[..self.precision];
            write!(f, "{} {}", self.operator, given.iter().join("."))
        } else {
            write!(f, "{} {}", self.operator, self.version)
        }
    }
}

/// A conjunction of requirements, kept in insertion order and free of duplicates
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequirementList {
    requirements: Vec<Requirement>,
}

impl RequirementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<'a>(
        requirements: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, RequirementError> {
        requirements.into_iter().map(Requirement::parse).collect()
    }

    /// Adds a requirement unless an equal one is already present. Returns whether it was added.
    pub fn add(&mut self, requirement: Requirement) -> bool {
        if self.requirements.contains(&requirement) {
            return false;
        }
        self.requirements.push(requirement);
        true
    }

    /// Whether every requirement is satisfied (vacuously true for an empty list)
    pub fn satisfied_by(&self, candidate: &Version) -> bool {
        self.requirements.iter().all(|r| r.satisfied_by(candidate))
    }

    pub fn is_pre_release(&self) -> bool {
        self.requirements.iter().any(Requirement::is_pre_release)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> + '_ {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl From<Requirement> for RequirementList {
    fn from(requirement: Requirement) -> Self {
        Self {
            requirements: vec![requirement],
        }
    }
}

impl FromIterator<Requirement> for RequirementList {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        let mut list = RequirementList::new();
        for requirement in iter {
            list.add(requirement);
        }
        list
    }
}

impl fmt::Display for RequirementList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.requirements.iter().join(", "))
    }
}
