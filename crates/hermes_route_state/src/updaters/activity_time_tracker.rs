use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    problem::{
        activity_costs::ActivityCost, location::LocationIdx, transport_costs::TransportCost,
    },
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    updaters::activity_start_policy::ActivityStartPolicy,
    utils::time::saturating_add,
};

/// Walks a route forward and computes arrival, start and end of every activity.
///
/// It writes nothing itself, so several updaters can each own one and stay
/// independent of each other.
pub struct ActivityTimeTracker {
    transport_costs: Arc<dyn TransportCost>,
    activity_costs: Arc<dyn ActivityCost>,
    start_policy: Arc<dyn ActivityStartPolicy>,

    previous_location: LocationIdx,
    previous_end_time: Timestamp,

    arrival_time: Timestamp,
    start_time: Timestamp,
    end_time: Timestamp,
}

impl ActivityTimeTracker {
    pub fn new(
        transport_costs: Arc<dyn TransportCost>,
        activity_costs: Arc<dyn ActivityCost>,
        start_policy: Arc<dyn ActivityStartPolicy>,
    ) -> Self {
        ActivityTimeTracker {
            transport_costs,
            activity_costs,
            start_policy,
            previous_location: LocationIdx::default(),
            previous_end_time: Timestamp::UNIX_EPOCH,
            arrival_time: Timestamp::UNIX_EPOCH,
            start_time: Timestamp::UNIX_EPOCH,
            end_time: Timestamp::UNIX_EPOCH,
        }
    }

    pub fn begin(&mut self, route: &VehicleRoute) {
        self.previous_location = route.start().location_id();
        self.previous_end_time = route.departure_time();

        self.arrival_time = route.departure_time();
        self.start_time = route.departure_time();
        self.end_time = route.departure_time();
    }

    pub fn visit(&mut self, route: &RouteContext<'_>, activity: &Activity) {
        let travel_time = self.transport_costs.transport_time(
            self.previous_location,
            activity.location_id(),
            self.previous_end_time,
            route.driver,
            route.vehicle,
        );

        let arrival_time = saturating_add(self.previous_end_time, travel_time);
        let start_time = self.start_policy.start_time(arrival_time, activity);
        let duration = self.activity_costs.activity_duration(
            activity,
            arrival_time,
            route.driver,
            route.vehicle,
        );
        let end_time = saturating_add(start_time, duration);

        self.arrival_time = arrival_time;
        self.start_time = start_time;
        self.end_time = end_time;

        self.previous_location = activity.location_id();
        self.previous_end_time = end_time;
    }

    /// Arrival at the end anchor. The vehicle does not wait there.
    pub fn finish(&mut self, route: &VehicleRoute) {
        let travel_time = self.transport_costs.transport_time(
            self.previous_location,
            route.end().location_id(),
            self.previous_end_time,
            route.driver(),
            route.vehicle(),
        );

        let arrival_time = saturating_add(self.previous_end_time, travel_time);

        self.arrival_time = arrival_time;
        self.start_time = arrival_time;
        self.end_time = arrival_time;

        self.previous_location = route.end().location_id();
        self.previous_end_time = arrival_time;
    }

    pub fn previous_location(&self) -> LocationIdx {
        self.previous_location
    }

    pub fn arrival_time(&self) -> Timestamp {
        self.arrival_time
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }
}
