use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::dependency::Dependency;
use crate::error::ResolutionError;
use crate::version::Version;

/// Source of the libraries known to the resolver.
///
/// Both methods must be pure functions of their inputs: the resolver caches their results
/// through a [`DataProviderCache`].
pub trait DataProvider {
    /// Retrieve the versions available for the library identified by `name`.
    ///
    /// Versions are lenient strings (`"1"`, `"1.2"` and `"1.2.3-rc.1"` are all accepted) in any
    /// order. An unknown library has no versions.
    fn available_versions(&self, name: &str) -> Vec<String>;

    /// Produce the dependencies declared by the given version of the library
    fn dependencies_of(&self, name: &str, version: &Version) -> Vec<Dependency>;
}

/// Memoizes the requests made to a [`DataProvider`], which are idempotent and repeated across
/// many branches of the search.
pub struct DataProviderCache<P> {
    provider: P,
    versions: RefCell<FxHashMap<String, Arc<[Version]>>>,
    dependencies: RefCell<FxHashMap<(String, Version), Arc<[Dependency]>>>,
}

impl<P: DataProvider> DataProviderCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            versions: RefCell::new(FxHashMap::default()),
            dependencies: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The available versions of `name`, parsed, deduplicated and sorted from lowest to highest
    pub fn available_versions(&self, name: &str) -> Result<Arc<[Version]>, ResolutionError> {
        if let Some(versions) = self.versions.borrow().get(name) {
            return Ok(versions.clone());
        }

        let mut versions = self
            .provider
            .available_versions(name)
            .iter()
            .map(|v| Version::lenient_parse(v))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ResolutionError::InvalidVersion {
                name: name.to_string(),
                source,
            })?;
        versions.sort();
        versions.dedup();

        let versions: Arc<[Version]> = versions.into();
        self.versions
            .borrow_mut()
            .insert(name.to_string(), versions.clone());
        Ok(versions)
    }

    /// The dependencies declared by `version` of `name`
    pub fn dependencies_of(&self, name: &str, version: &Version) -> Arc<[Dependency]> {
        let key = (name.to_string(), version.clone());
        if let Some(dependencies) = self.dependencies.borrow().get(&key) {
            return dependencies.clone();
        }

        let dependencies: Arc<[Dependency]> =
            self.provider.dependencies_of(name, version).into();
        self.dependencies
            .borrow_mut()
            .insert(key, dependencies.clone());
        dependencies
    }

    /// Selects the libraries for which exactly one version is available
    pub fn libraries_with_unique_versions<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<&'a str>, ResolutionError> {
        let mut unique = Vec::new();
        for name in names {
            if self.available_versions(name)?.len() == 1 {
                unique.push(name);
            }
        }
        Ok(unique)
    }

    /// Forget every memoized request
    pub fn clear(&self) {
        self.versions.borrow_mut().clear();
        self.dependencies.borrow_mut().clear();
    }
}
