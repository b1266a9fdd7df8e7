use crate::{
    error::StateError,
    problem::capacity::Capacity,
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    state::{
        state_key::{FUTURE_MAX_LOAD, MAX_LOAD, PAST_MAX_LOAD},
        state_store::StateStore,
    },
    updaters::{
        state_updater::StateUpdater,
        update_loads::{load_at_beginning, load_at_end},
        visitor::{ActivityVisitor, ReverseActivityVisitor},
    },
};

/// Maximum load seen between the start of the route and each activity.
///
/// Also stores the maximum over the whole route once the end is reached.
#[derive(Debug, Default)]
pub struct UpdateMaxLoadLookingBackward {
    current_load: Capacity,
    max_load: Capacity,
}

impl UpdateMaxLoadLookingBackward {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivityVisitor for UpdateMaxLoadLookingBackward {
    fn begin(&mut self, route: &VehicleRoute, states: &mut StateStore) -> Result<(), StateError> {
        self.current_load = load_at_beginning(route, states)?;
        self.max_load = self.current_load.clone();
        Ok(())
    }

    fn visit(
        &mut self,
        _route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.current_load = &self.current_load + activity.load_change();
        self.max_load = Capacity::max(&self.max_load, &self.current_load);

        states.put_internal_activity_state(activity.index(), PAST_MAX_LOAD, self.max_load.clone())
    }

    fn finish(
        &mut self,
        route: &mut VehicleRoute,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        let max_load = std::mem::take(&mut self.max_load);
        self.current_load = Capacity::empty();

        states.put_internal_route_state(route.id(), MAX_LOAD, max_load)
    }
}

impl StateUpdater for UpdateMaxLoadLookingBackward {
    fn name(&self) -> &'static str {
        "update_max_load_looking_backward"
    }

    fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
        Some(self)
    }
}

/// Maximum load seen between each activity and the end of the route.
///
/// Loads are rebuilt backwards from the load at the end, the forward load
/// states are never read.
#[derive(Debug, Default)]
pub struct UpdateMaxLoadLookingForward {
    current_load: Capacity,
    max_load: Capacity,
}

impl UpdateMaxLoadLookingForward {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReverseActivityVisitor for UpdateMaxLoadLookingForward {
    fn begin(&mut self, route: &VehicleRoute, states: &mut StateStore) -> Result<(), StateError> {
        self.current_load = load_at_end(route, states)?;
        self.max_load = self.current_load.clone();
        Ok(())
    }

    fn visit(
        &mut self,
        _route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        // `current_load` is the load when leaving the activity
        self.max_load = Capacity::max(&self.max_load, &self.current_load);
        states.put_internal_activity_state(
            activity.index(),
            FUTURE_MAX_LOAD,
            self.max_load.clone(),
        )?;

        self.current_load = &self.current_load - activity.load_change();
        Ok(())
    }

    fn finish(
        &mut self,
        _route: &mut VehicleRoute,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.current_load = Capacity::empty();
        self.max_load = Capacity::empty();
        Ok(())
    }
}

impl StateUpdater for UpdateMaxLoadLookingForward {
    fn name(&self) -> &'static str {
        "update_max_load_looking_forward"
    }

    fn as_backward_visitor(&mut self) -> Option<&mut dyn ReverseActivityVisitor> {
        Some(self)
    }
}
