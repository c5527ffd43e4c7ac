use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use itertools::Itertools;

use crate::error::VersionError;
use crate::requirement::{Operator, Requirement};

/// A single dot-separated identifier of a pre-release or build component.
///
/// The variant order matters: numeric identifiers always sort below alphanumeric ones. Numeric
/// identifiers must fit in a `u64`; larger ones make the version malformed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Numeric(u64),
    Alphanumeric(String),
}

impl Identifier {
    fn parse(identifier: &str) -> Option<Self> {
        if identifier.is_empty()
            || !identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return None;
        }

        if is_numeric(identifier) {
            identifier.parse().ok().map(Identifier::Numeric)
        } else {
            Some(Identifier::Alphanumeric(identifier.to_string()))
        }
    }

    /// The identifier with its first number incremented, if it contains one
    fn succ(&self) -> Option<Self> {
        match self {
            Identifier::Numeric(n) => n.checked_add(1).map(Identifier::Numeric),
            Identifier::Alphanumeric(s) => {
                let start = s.find(|c: char| c.is_ascii_digit())?;
                let len = s[start..]
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(s.len() - start);
                let bumped = s[start..start + len].parse::<u64>().ok()?.checked_add(1)?;
                Some(Identifier::Alphanumeric(format!(
                    "{}{}{}",
                    &s[..start],
                    bumped,
                    &s[start + len..]
                )))
            }
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::Alphanumeric(s) => f.write_str(s),
        }
    }
}

/// An immutable, validated version of the form `MAJOR.MINOR.PATCH[-pre][+build]`.
///
/// Shorter numeric strings such as `1` or `1.2` are accepted through [`Version::normalize`] and
/// [`Version::lenient_parse`], which pad them with trailing `.0` identifiers. Build metadata is kept for display purposes but is ignored by equality, hashing and
/// ordering.
#[derive(Clone, Debug)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Vec<Identifier>,
    build: Vec<Identifier>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: Vec::new(),
            build: Vec::new(),
        }
    }

    /// Parses a version string, which must contain exactly three numeric identifiers
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let input = input.trim();
        let malformed = || VersionError::Malformed(input.to_string());

        let (rest, build) = match input.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (input, None),
        };
        let (main, pre_release) = match rest.split_once('-') {
            Some((main, pre_release)) => (main, Some(pre_release)),
            None => (rest, None),
        };

        let numbers = main
            .split('.')
            .map(|part| if is_numeric(part) { part.parse::<u64>().ok() } else { None })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(malformed)?;
        let (major, minor, patch) = match numbers.as_slice() {
            &[major, minor, patch] => (major, minor, patch),
            _ => return Err(malformed()),
        };

        let pre_release = match pre_release {
            Some(component) => split_identifiers(component).ok_or_else(malformed)?,
            None => Vec::new(),
        };
        let build = match build {
            Some(component) => split_identifiers(component).ok_or_else(malformed)?,
            None => Vec::new(),
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre_release,
            build,
        })
    }

    /// Parses a version after padding it through [`Version::normalize`]
    pub fn lenient_parse(input: &str) -> Result<Self, VersionError> {
        Self::parse(&Self::normalize(input))
    }

    /// Pads a version made of one or two numeric identifiers with trailing `.0` identifiers.
    /// Any other input is returned trimmed but otherwise untouched.
    pub fn normalize(input: &str) -> String {
        let mut version = input.trim().to_string();
        if is_numeric(&version) {
            version.push_str(".0");
        }
        if let Some((major, minor)) = version.split_once('.') {
            if is_numeric(major) && is_numeric(minor) {
                version.push_str(".0");
            }
        }
        version
    }

    /// Whether the given string is a valid (non-normalized) version
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn number_component(&self) -> [u64; 3] {
        [self.major, self.minor, self.patch]
    }

    pub fn pre_release_component(&self) -> &[Identifier] {
        &self.pre_release
    }

    pub fn build_component(&self) -> &[Identifier] {
        &self.build
    }

    pub fn is_pre_release(&self) -> bool {
        !self.pre_release.is_empty()
    }

    /// The version stripped of its pre-release and build components
    pub fn release_version(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }

    /// The exclusive upper bound implied by `~>` on this (full precision) version, i.e. the next
    /// minor version: `2.1.0` bumps to `2.2.0`.
    pub fn optimistic_bump(&self) -> Option<Version> {
        self.next_minor()
    }

    /// The `~>` requirement expected to preserve backwards compatibility with this version
    pub fn optimistic_recommendation(&self) -> Requirement {
        if self.major == 0 {
            Requirement::with_precision(Operator::Pessimistic, self.release_version(), 3)
        } else {
            Requirement::with_precision(Operator::Pessimistic, self.release_version(), 2)
        }
    }

    /// Bumps the numeric identifier at `index` (0 is major, 2 is patch), resetting the ones
    /// after it
    pub fn bump(&self, index: usize) -> Result<Version, VersionError> {
        let bumped = match index {
            0 => self.next_major(),
            1 => self.next_minor(),
            2 => self.next_patch(),
            _ => return Err(VersionError::UnsupportedIndex(index)),
        };
        bumped.ok_or_else(|| VersionError::Overflow {
            version: self.to_string(),
            index,
        })
    }

    /// `None` once the major identifier reaches `u64::MAX`, and likewise for the other helpers
    pub fn next_major(&self) -> Option<Version> {
        Some(Version::new(self.major.checked_add(1)?, 0, 0))
    }

    pub fn next_minor(&self) -> Option<Version> {
        Some(Version::new(self.major, self.minor.checked_add(1)?, 0))
    }

    pub fn next_patch(&self) -> Option<Version> {
        Some(Version::new(self.major, self.minor, self.patch.checked_add(1)?))
    }

    /// Increments the first number found in the pre-release component, dropping the
    /// identifiers that follow it. Returns `None` if there is nothing to increment.
    pub fn next_pre_release(&self) -> Option<Version> {
        let mut identifiers = Vec::with_capacity(self.pre_release.len());
        for identifier in &self.pre_release {
            if let Some(bumped) = identifier.succ() {
                identifiers.push(bumped);
                return Some(Version {
                    pre_release: identifiers,
                    ..self.release_version()
                });
            }
            identifiers.push(identifier.clone());
        }

        None
    }

    /// All the versions this one might directly evolve into
    pub fn next_versions(&self) -> Vec<Version> {
        [
            self.next_major(),
            self.next_minor(),
            self.next_patch(),
            self.next_pre_release(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn is_valid_next_version(&self, candidate: &Version) -> bool {
        self.next_versions().contains(candidate)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre_release.is_empty() {
            write!(f, "-{}", self.pre_release.iter().join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build.iter().join("."))?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number_component().hash(state);
        self.pre_release.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number_component()
            .cmp(&other.number_component())
            .then_with(|| {
                match (self.pre_release.is_empty(), other.pre_release.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    // Element-wise, a longer sequence wins when all shared positions tie
                    (false, false) => self.pre_release.cmp(&other.pre_release),
                }
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn split_identifiers(component: &str) -> Option<Vec<Identifier>> {
    component.split('.').map(Identifier::parse).collect()
}
