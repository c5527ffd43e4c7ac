use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::error::RequirementError;
use crate::requirement::RequirementList;
use crate::version::Version;

/// A named library constrained by a list of requirements.
///
/// `required_by` is the chain of dependencies whose activation introduced this one, from the
/// root-level dependency down to the direct parent. It is filled in by the resolver and only
/// used to pick backjump targets and to explain failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub requirements: RequirementList,
    pub required_by: Vec<Arc<Dependency>>,
    pub source: Option<String>,
    pub platform: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, requirements: RequirementList) -> Self {
        Self {
            name: name.into(),
            requirements,
            required_by: Vec::new(),
            source: None,
            platform: None,
        }
    }

    /// Creates a dependency from requirement strings, e.g. `Dependency::parse("foo", [">= 1.0"])`
    pub fn parse<'a>(
        name: impl Into<String>,
        requirements: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, RequirementError> {
        Ok(Self::new(name, RequirementList::parse(requirements)?))
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn satisfied_by(&self, version: &Version) -> bool {
        self.requirements.satisfied_by(version)
    }

    /// Whether the dependency was requested directly rather than transitively
    pub fn is_root(&self) -> bool {
        self.required_by.is_empty()
    }

    /// The direct parent, i.e. the dependency that introduced this one
    pub fn parent(&self) -> Option<&Arc<Dependency>> {
        self.required_by.last()
    }

    /// The names along the `required_by` chain, e.g. `A -> B`
    pub fn requirer_chain(&self) -> String {
        self.required_by.iter().map(|d| d.name.as_str()).join(" -> ")
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requirements.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} ({})", self.name, self.requirements)
        }
    }
}

/// A candidate considered during activation: a version of a library together with the
/// sub-dependencies it declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecGroup {
    pub name: String,
    pub version: Version,
    pub platform: Option<String>,
    pub dependencies: Vec<Dependency>,
    /// The chain that led to this activation, ending with the dependency it satisfies
    pub required_by: Vec<Arc<Dependency>>,
}

impl fmt::Display for SpecGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A named set of root-level dependencies resolved together
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyGroup {
    pub name: String,
    pub dependencies: Vec<Dependency>,
}

impl DependencyGroup {
    pub fn new(name: impl Into<String>, dependencies: Vec<Dependency>) -> Self {
        Self {
            name: name.into(),
            dependencies,
        }
    }
}
