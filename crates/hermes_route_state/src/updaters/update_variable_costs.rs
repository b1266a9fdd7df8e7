use std::sync::Arc;

use tracing::trace;

use crate::{
    error::StateError,
    problem::{
        activity_costs::ActivityCost, transport_costs::TransportCost, travel_cost_matrix::Cost,
    },
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    state::{state_key::COSTS, state_store::StateStore},
    updaters::{
        activity_start_policy::ActivityStartPolicy,
        activity_time_tracker::ActivityTimeTracker,
        state_updater::StateUpdater,
        visitor::ActivityVisitor,
    },
};

/// Accumulated transport and activity costs along the route.
///
/// Schedules the route with its own time tracker, so it does not depend on
/// the activity times written by other updaters.
pub struct UpdateVariableCosts {
    transport_costs: Arc<dyn TransportCost>,
    activity_costs: Arc<dyn ActivityCost>,
    tracker: ActivityTimeTracker,
    total_costs: Cost,
}

impl UpdateVariableCosts {
    pub fn new(
        transport_costs: Arc<dyn TransportCost>,
        activity_costs: Arc<dyn ActivityCost>,
        start_policy: Arc<dyn ActivityStartPolicy>,
    ) -> Self {
        UpdateVariableCosts {
            tracker: ActivityTimeTracker::new(
                Arc::clone(&transport_costs),
                Arc::clone(&activity_costs),
                start_policy,
            ),
            transport_costs,
            activity_costs,
            total_costs: 0.0,
        }
    }
}

impl ActivityVisitor for UpdateVariableCosts {
    fn begin(&mut self, route: &VehicleRoute, _states: &mut StateStore) -> Result<(), StateError> {
        self.tracker.begin(route);
        self.total_costs = 0.0;
        Ok(())
    }

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        let transport_cost = self.transport_costs.transport_cost(
            self.tracker.previous_location(),
            activity.location_id(),
            self.tracker.end_time(),
            route.driver,
            route.vehicle,
        );

        self.tracker.visit(route, activity);

        let activity_cost = self.activity_costs.activity_cost(
            activity,
            self.tracker.arrival_time(),
            route.driver,
            route.vehicle,
        );

        self.total_costs += transport_cost + activity_cost;
        states.put_internal_activity_state(activity.index(), COSTS, self.total_costs)
    }

    fn finish(
        &mut self,
        route: &mut VehicleRoute,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        let transport_cost = self.transport_costs.transport_cost(
            self.tracker.previous_location(),
            route.end().location_id(),
            self.tracker.end_time(),
            route.driver(),
            route.vehicle(),
        );

        self.tracker.finish(route);

        let activity_cost = self.activity_costs.activity_cost(
            route.end(),
            self.tracker.arrival_time(),
            route.driver(),
            route.vehicle(),
        );

        self.total_costs += transport_cost + activity_cost;
        trace!(route = %route.id(), costs = self.total_costs, "Route variable costs");

        let total_costs = std::mem::take(&mut self.total_costs);
        states.put_internal_route_state(route.id(), COSTS, total_costs)
    }
}

impl StateUpdater for UpdateVariableCosts {
    fn name(&self) -> &'static str {
        "update_variable_costs"
    }

    fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
        Some(self)
    }
}
