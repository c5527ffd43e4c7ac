use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::conflict::{Conflict, ConflictMap};
use crate::delegate::{Delegate, NoOpDelegate};
use crate::dependency::{Dependency, DependencyGroup, SpecGroup};
use crate::error::ResolutionError;
use crate::provider::{DataProvider, DataProviderCache};
use crate::version::Version;

/// Name of the group used by [`Resolver::resolve_dependencies`]
pub const DEFAULT_GROUP: &str = "default";

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Upper bound on the number of search steps before giving up with
    /// [`ResolutionError::ResolutionTooDeep`]
    pub max_iterations: u64,
    /// Approximate wall-clock time between two [`Delegate::on_progress_tick`] calls
    pub progress_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            progress_interval: Duration::from_secs(1),
        }
    }
}

/// The version chosen for a library
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    pub version: Version,
    pub platform: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GroupResolution {
    pub name: String,
    /// The libraries reachable from the roots of the group
    pub mapping: BTreeMap<String, Activation>,
    /// Edges go from a library to its dependencies; the `None` node is the group itself
    pub graph: DiGraph<Option<String>, ()>,
}

impl GroupResolution {
    fn build(
        name: &str,
        roots: &[Arc<Dependency>],
        activated: &FxHashMap<String, Arc<SpecGroup>>,
    ) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(None);

        let mut nodes: FxHashMap<&str, NodeIndex> = FxHashMap::default();
        let mut mapping = BTreeMap::new();
        let mut queue: VecDeque<(NodeIndex, &str)> =
            roots.iter().map(|d| (root, d.name.as_str())).collect();

        while let Some((parent, library)) = queue.pop_front() {
            let Some(spec_group) = activated.get(library) else {
                continue;
            };

            let node = match nodes.get(library) {
                Some(&node) => node,
                None => {
                    let node = graph.add_node(Some(library.to_string()));
                    nodes.insert(library, node);
                    mapping.insert(
                        library.to_string(),
                        Activation {
                            version: spec_group.version.clone(),
                            platform: spec_group.platform.clone(),
                        },
                    );
                    queue.extend(
                        spec_group
                            .dependencies
                            .iter()
                            .map(|d| (node, d.name.as_str())),
                    );
                    node
                }
            };
            graph.update_edge(parent, node, ());
        }

        Self {
            name: name.to_string(),
            mapping,
            graph,
        }
    }

    /// The activated libraries, dependencies before their dependents. Returns `None` if the
    /// dependencies form a cycle.
    pub fn installation_order(&self) -> Option<Vec<&str>> {
        let sorted = toposort(&self.graph, None).ok()?;
        Some(
            sorted
                .into_iter()
                .rev()
                .filter_map(|node| self.graph[node].as_deref())
                .collect(),
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolutionResult {
    pub groups: Vec<GroupResolution>,
}

impl ResolutionResult {
    pub fn group(&self, name: &str) -> Option<&GroupResolution> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// The activations of every group. A library never has more than one version across groups.
    pub fn activations(&self) -> BTreeMap<&str, &Activation> {
        self.groups
            .iter()
            .flat_map(|g| g.mapping.iter())
            .map(|(name, activation)| (name.as_str(), activation))
            .collect()
    }
}

/// The result of exploring a branch of the search
enum Outcome {
    /// Every requirement is satisfied; the activation set is stored in [`Resolution::solved`]
    Solved,
    /// The branch was exhausted. Carries the conflicting library when the failure was caught at
    /// the decision point which started the branch.
    Failed(Option<String>),
    /// Unwind to the decision point named `target`, skipping every frame in between
    Backtrack {
        target: String,
        conflict: Option<String>,
    },
}

/// Counts search iterations and decides when to report progress. The reporting rate is the
/// number of iterations performed during the first `interval` of the search.
struct Progress {
    started_at: Instant,
    interval: Duration,
    iterations: u64,
    rate: Option<u64>,
}

impl Progress {
    fn new(interval: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            interval,
            iterations: 0,
            rate: None,
        }
    }

    /// Returns whether a progress notification is due
    fn tick(&mut self) -> bool {
        self.iterations += 1;
        match self.rate {
            Some(rate) => self.iterations % rate == 0,
            None => {
                if self.started_at.elapsed() >= self.interval {
                    self.rate = Some(self.iterations);
                }
                false
            }
        }
    }
}

struct Resolution<'r, P, D> {
    cache: &'r DataProviderCache<P>,
    delegate: &'r D,
    max_iterations: u64,
    progress: Progress,
    group: String,
    activated: FxHashMap<String, Arc<SpecGroup>>,
    errors: ConflictMap,
    /// Names of the decision points of the branch being explored, innermost last
    stack: Vec<String>,
    solved: Option<FxHashMap<String, Arc<SpecGroup>>>,
}

impl<'r, P: DataProvider, D: Delegate> Resolution<'r, P, D> {
    fn new(
        cache: &'r DataProviderCache<P>,
        delegate: &'r D,
        max_iterations: u64,
        progress_interval: Duration,
    ) -> Self {
        Self {
            cache,
            delegate,
            max_iterations,
            progress: Progress::new(progress_interval),
            group: String::new(),
            activated: FxHashMap::default(),
            errors: ConflictMap::default(),
            stack: Vec::new(),
            solved: None,
        }
    }

    /// Resolves the groups in order. Activations are shared: a library activated for one group
    /// constrains every group resolved after it.
    fn resolve(
        mut self,
        groups: Vec<DependencyGroup>,
    ) -> Result<ResolutionResult, ResolutionError> {
        let mut result = ResolutionResult::default();

        for group in groups {
            info!(
                "resolving {} dependencies of group `{}`",
                group.dependencies.len(),
                group.name
            );
            self.delegate.on_group_resolution_start(&group.name);
            self.group = group.name.clone();
            self.errors = ConflictMap::default();

            let roots: Vec<Arc<Dependency>> =
                group.dependencies.into_iter().map(Arc::new).collect();
            let outcome = self.resolve_requirements(roots.clone());
            self.delegate.on_group_resolution_end();

            match outcome? {
                Outcome::Solved => {
                    if let Some(activated) = self.solved.take() {
                        self.activated = activated;
                    }
                    let resolution = GroupResolution::build(&group.name, &roots, &self.activated);
                    info!(
                        "group `{}` resolved to {} libraries",
                        group.name,
                        resolution.mapping.len()
                    );
                    result.groups.push(resolution);
                }
                Outcome::Backtrack { target, .. } => {
                    debug!("no decision point named `{target}` is left to resume");
                    return Err(self.version_conflict());
                }
                Outcome::Failed(_) => return Err(self.version_conflict()),
            }
        }

        Ok(result)
    }

    fn resolve_requirements(
        &mut self,
        mut reqs: Vec<Arc<Dependency>>,
    ) -> Result<Outcome, ResolutionError> {
        loop {
            self.indicate_progress()?;

            if reqs.is_empty() {
                self.solved = Some(self.activated.clone());
                return Ok(Outcome::Solved);
            }

            self.sort_requirements(&mut reqs)?;
            let current = reqs.remove(0);
            debug!(depth = self.stack.len(), "attempting {current}");

            match self.activated.get(&current.name) {
                Some(existing) if current.satisfied_by(&existing.version) => continue,
                Some(existing) => {
                    let existing = existing.clone();
                    return self.conflict_with_activated(existing, current);
                }
                None => return self.activate_candidates(current, reqs),
            }
        }
    }

    /// `current` cannot be satisfied by the version already activated for its library. Jump
    /// back to the parent of `current`, or to where `existing` was activated for a root-level
    /// requirement.
    fn conflict_with_activated(
        &mut self,
        existing: Arc<SpecGroup>,
        current: Arc<Dependency>,
    ) -> Result<Outcome, ResolutionError> {
        debug!("{current} conflicts with the activated {existing}");
        self.errors.record(Conflict {
            name: current.name.clone(),
            existing: Some(existing.clone()),
            requirement: current.clone(),
        });

        let target = current
            .parent()
            .or_else(|| existing.required_by.last())
            .map(|parent| parent.name.clone());

        match target {
            Some(target) => Ok(self.backjump(target, Some(existing.name.clone()))),
            None => Err(self.version_conflict()),
        }
    }

    /// Tries every version matching `current`, newest first
    fn activate_candidates(
        &mut self,
        current: Arc<Dependency>,
        reqs: Vec<Arc<Dependency>>,
    ) -> Result<Outcome, ResolutionError> {
        let matching = self.search(&current)?;
        trace!("{} candidates for {current}", matching.len());

        if matching.is_empty() {
            if current.is_root() {
                return Err(ResolutionError::NoMatchingVersion {
                    group: self.group.clone(),
                    dependency: Box::new(current.as_ref().clone()),
                });
            }
            debug!("no version matches {current}");
            self.errors.record(Conflict {
                name: current.name.clone(),
                existing: None,
                requirement: current.clone(),
            });
        }

        let mut conflicts = BTreeSet::new();
        for version in matching {
            match self.attempt(&current, version, reqs.clone())? {
                Outcome::Failed(Some(conflict)) => {
                    conflicts.insert(conflict);
                }
                Outcome::Failed(None) => {}
                outcome => return Ok(outcome),
            }
        }

        if conflicts.is_empty() {
            return Ok(Outcome::Failed(None));
        }

        let target = match current.parent() {
            // Skip the branches that have no effect on the conflict by jumping to the closest
            // decision point that does
            Some(parent) => self.conflict_pivot(&conflicts, &parent.name),
            // Retry the parent of the conflicting library, wherever it was activated
            None => self
                .stack
                .iter()
                .rev()
                .find(|name| conflicts.contains(*name))
                .map(|name| (name.clone(), None)),
        };

        Ok(match target {
            Some((target, conflict)) => self.backjump(target, conflict),
            None => Outcome::Failed(None),
        })
    }

    /// The closest decision point affecting one of `conflicts`, most recently recorded first
    fn conflict_pivot(
        &self,
        conflicts: &BTreeSet<String>,
        parent: &str,
    ) -> Option<(String, Option<String>)> {
        for conflict in self.errors.iter_recent_first() {
            if !conflicts.contains(&conflict.name) {
                continue;
            }

            let pivot = self
                .stack
                .iter()
                .rev()
                .find(|name| name.as_str() == conflict.name || name.as_str() == parent);
            if let Some(pivot) = pivot {
                return Some((pivot.clone(), Some(conflict.name.clone())));
            }
        }

        None
    }

    /// Activates `version` for `current` and explores the branch it opens
    fn attempt(
        &mut self,
        current: &Arc<Dependency>,
        version: Version,
        mut reqs: Vec<Arc<Dependency>>,
    ) -> Result<Outcome, ResolutionError> {
        if !self
            .delegate
            .validate_version_for_group(&current.name, &version, &self.group)
        {
            debug!("{} {version} rejected for group `{}`", current.name, self.group);
            self.errors.record(Conflict {
                name: current.name.clone(),
                existing: None,
                requirement: current.clone(),
            });
            return Ok(Outcome::Failed(Some(current.name.clone())));
        }

        let dependencies = self.cache.dependencies_of(&current.name, &version);
        let mut required_by = current.required_by.clone();
        required_by.push(current.clone());

        for dependency in dependencies.iter() {
            let mut dependency = dependency.clone();
            dependency.required_by = required_by.clone();
            if dependency.platform.is_none() {
                dependency.platform = current.platform.clone();
            }
            reqs.push(Arc::new(dependency));
        }

        let spec_group = Arc::new(SpecGroup {
            name: current.name.clone(),
            version,
            platform: current.platform.clone(),
            dependencies: dependencies.to_vec(),
            required_by,
        });
        debug!(depth = self.stack.len(), "activating {spec_group}");
        self.delegate.on_activation(&spec_group);
        self.activated.insert(current.name.clone(), spec_group);

        // The decision point is named after the library, so that conflicts found deeper in the
        // branch can jump back here and try the next version
        let saved = self.stack.len();
        self.stack.push(current.name.clone());
        let outcome = self.resolve_requirements(reqs);
        self.stack.truncate(saved);
        self.activated.remove(&current.name);

        Ok(match outcome? {
            Outcome::Backtrack { target, conflict } if target == current.name => {
                Outcome::Failed(conflict)
            }
            outcome => outcome,
        })
    }

    fn backjump(&self, target: String, conflict: Option<String>) -> Outcome {
        debug!("jumping to `{target}`");
        self.delegate.on_backjump(&target);
        Outcome::Backtrack { target, conflict }
    }

    /// Orders the requirements so that the easiest to resolve come first: already activated
    /// libraries, then release requirements, then libraries without recorded conflicts, then
    /// the ones with fewer matching versions. The sort is stable, ties keep queue order.
    fn sort_requirements(&self, reqs: &mut Vec<Arc<Dependency>>) -> Result<(), ResolutionError> {
        let unique: FxHashSet<String> = self
            .cache
            .libraries_with_unique_versions(reqs.iter().map(|r| r.name.as_str()))?
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut keyed = Vec::with_capacity(reqs.len());
        for dependency in reqs.drain(..) {
            let activated = self.activated.contains_key(&dependency.name);
            let candidates = if activated {
                0
            } else if unique.contains(&dependency.name) {
                1
            } else {
                self.search(&dependency)?.len()
            };
            let key = (
                !activated,
                dependency.requirements.is_pre_release(),
                self.errors.contains(&dependency.name),
                candidates,
            );
            keyed.push((key, dependency));
        }

        keyed.sort_by_key(|(key, _)| *key);
        reqs.extend(keyed.into_iter().map(|(_, dependency)| dependency));
        Ok(())
    }

    /// The versions satisfying `dependency`, highest first
    fn search(&self, dependency: &Dependency) -> Result<Vec<Version>, ResolutionError> {
        let versions = self.cache.available_versions(&dependency.name)?;
        Ok(versions
            .iter()
            .rev()
            .filter(|v| dependency.satisfied_by(v))
            .cloned()
            .collect())
    }

    fn indicate_progress(&mut self) -> Result<(), ResolutionError> {
        if self.progress.tick() {
            self.delegate.on_progress_tick();
        }
        if self.progress.iterations > self.max_iterations {
            return Err(ResolutionError::ResolutionTooDeep(self.max_iterations));
        }
        Ok(())
    }

    fn version_conflict(&self) -> ResolutionError {
        ResolutionError::VersionConflict(self.errors.report(&self.group))
    }
}

pub struct Resolver<P, D = NoOpDelegate> {
    cache: DataProviderCache<P>,
    delegate: D,
    config: ResolverConfig,
}

impl<P: DataProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            cache: DataProviderCache::new(provider),
            delegate: NoOpDelegate,
            config: ResolverConfig::default(),
        }
    }
}

impl<P: DataProvider, D: Delegate> Resolver<P, D> {
    pub fn with_delegate<E: Delegate>(self, delegate: E) -> Resolver<P, E> {
        Resolver {
            cache: self.cache,
            delegate,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &DataProviderCache<P> {
        &self.cache
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Resolve the given root dependencies as a single group named [`DEFAULT_GROUP`]
    pub fn resolve_dependencies(
        &self,
        dependencies: Vec<Dependency>,
    ) -> Result<ResolutionResult, ResolutionError> {
        self.resolve(vec![DependencyGroup::new(DEFAULT_GROUP, dependencies)])
    }

    pub fn resolve(
        &self,
        groups: Vec<DependencyGroup>,
    ) -> Result<ResolutionResult, ResolutionError> {
        self.resolve_bounded(groups, self.config.max_iterations)
    }

    pub fn resolve_bounded(
        &self,
        groups: Vec<DependencyGroup>,
        max_iterations: u64,
    ) -> Result<ResolutionResult, ResolutionError> {
        let resolution = Resolution::new(
            &self.cache,
            &self.delegate,
            max_iterations,
            self.config.progress_interval,
        );
        resolution.resolve(groups)
    }
}
