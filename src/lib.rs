mod conflict;
mod delegate;
mod dependency;
mod error;
mod provider;
mod requirement;
mod resolver;
mod version;

pub use conflict::{Conflict, ConflictReport};
pub use delegate::{Delegate, NoOpDelegate};
pub use dependency::{Dependency, DependencyGroup, SpecGroup};
pub use error::{RequirementError, ResolutionError, VersionError};
pub use provider::{DataProvider, DataProviderCache};
pub use requirement::{Operator, Requirement, RequirementList};
pub use resolver::{
    Activation, GroupResolution, ResolutionResult, Resolver, ResolverConfig, DEFAULT_GROUP,
};
pub use version::{Identifier, Version};
