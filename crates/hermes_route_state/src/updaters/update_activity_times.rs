use std::sync::Arc;

use crate::{
    error::StateError,
    problem::{activity_costs::ActivityCost, transport_costs::TransportCost},
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    state::state_store::StateStore,
    updaters::{
        activity_start_policy::ActivityStartPolicy,
        activity_time_tracker::ActivityTimeTracker,
        state_updater::StateUpdater,
        visitor::ActivityVisitor,
    },
};

/// Schedules every activity of the route.
///
/// Arrival and end times are written on the activities themselves, the end
/// anchor receives the arrival time at the end location.
pub struct UpdateActivityTimes {
    tracker: ActivityTimeTracker,
}

impl UpdateActivityTimes {
    pub fn new(
        transport_costs: Arc<dyn TransportCost>,
        activity_costs: Arc<dyn ActivityCost>,
        start_policy: Arc<dyn ActivityStartPolicy>,
    ) -> Self {
        UpdateActivityTimes {
            tracker: ActivityTimeTracker::new(transport_costs, activity_costs, start_policy),
        }
    }
}

impl ActivityVisitor for UpdateActivityTimes {
    fn begin(&mut self, route: &VehicleRoute, _states: &mut StateStore) -> Result<(), StateError> {
        self.tracker.begin(route);
        Ok(())
    }

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.tracker.visit(route, activity);

        activity.set_arrival_time(self.tracker.arrival_time());
        activity.set_end_time(self.tracker.end_time());
        Ok(())
    }

    fn finish(
        &mut self,
        route: &mut VehicleRoute,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.tracker.finish(route);

        let end = route.end_mut();
        end.set_arrival_time(self.tracker.arrival_time());
        end.set_end_time(self.tracker.end_time());
        Ok(())
    }
}

impl StateUpdater for UpdateActivityTimes {
    fn name(&self) -> &'static str {
        "update_activity_times"
    }

    fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
        Some(self)
    }
}
