use crate::{
    error::StateError,
    problem::job::JobIdx,
    solution::route::VehicleRoute,
    state::state_store::StateStore,
    updaters::visitor::{ActivityVisitor, ReverseActivityVisitor},
};

/// Hooks called by the search driver around ruin and recreate.
///
/// Every hook runs before the route traversals triggered by the same event.
pub trait StateListener {
    fn iteration_starts(
        &mut self,
        _iteration: usize,
        _routes: &[VehicleRoute],
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        Ok(())
    }

    fn insertion_starts(
        &mut self,
        _routes: &[VehicleRoute],
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        Ok(())
    }

    fn job_inserted(
        &mut self,
        _route: &VehicleRoute,
        _job_id: JobIdx,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        Ok(())
    }

    fn job_removed(
        &mut self,
        _route: &VehicleRoute,
        _job_id: JobIdx,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        Ok(())
    }

    fn insertion_ends(
        &mut self,
        _routes: &[VehicleRoute],
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        Ok(())
    }
}

/// Algorithm that keeps states up to date.
///
/// An updater declares the roles it plays by returning itself from the
/// matching accessor. The state manager wires it accordingly.
pub trait StateUpdater {
    fn name(&self) -> &'static str;

    fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
        None
    }

    fn as_backward_visitor(&mut self) -> Option<&mut dyn ReverseActivityVisitor> {
        None
    }

    fn as_listener(&mut self) -> Option<&mut dyn StateListener> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdaterRoles {
    pub forward: bool,
    pub backward: bool,
    pub listener: bool,
}

impl UpdaterRoles {
    pub fn of(updater: &mut dyn StateUpdater) -> Self {
        UpdaterRoles {
            forward: updater.as_forward_visitor().is_some(),
            backward: updater.as_backward_visitor().is_some(),
            listener: updater.as_listener().is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.forward && !self.backward && !self.listener
    }
}
