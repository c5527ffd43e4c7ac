use crate::dependency::SpecGroup;
use crate::version::Version;

/// Receives lifecycle notifications from the resolver and may veto activations.
///
/// Every method has a no-op default, so implementors only override what they need.
pub trait Delegate {
    /// Called before the dependencies of a group are resolved
    fn on_group_resolution_start(&self, _group: &str) {}

    /// Called after a group has been resolved, successfully or not
    fn on_group_resolution_end(&self) {}

    /// Called roughly once per progress interval while the search is running
    fn on_progress_tick(&self) {}

    /// Called when a candidate is tentatively activated
    fn on_activation(&self, _spec_group: &SpecGroup) {}

    /// Called when the search unwinds to the decision point named `target`
    fn on_backjump(&self, _target: &str) {}

    /// Whether `version` of library `name` may be activated for `group`.
    ///
    /// Returning `false` is treated as a conflict for that activation.
    fn validate_version_for_group(&self, _name: &str, _version: &Version, _group: &str) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpDelegate;

impl Delegate for NoOpDelegate {}
