use jiff::{SignedDuration, Timestamp};

use crate::{
    problem::{
        travel_cost_matrix::Cost,
        vehicle::{Driver, Vehicle},
    },
    solution::activity::Activity,
};

/// Cost and duration of performing an activity once the vehicle has arrived.
pub trait ActivityCost {
    fn activity_cost(
        &self,
        activity: &Activity,
        arrival_time: Timestamp,
        driver: &Driver,
        vehicle: &Vehicle,
    ) -> Cost;

    fn activity_duration(
        &self,
        activity: &Activity,
        arrival_time: Timestamp,
        driver: &Driver,
        vehicle: &Vehicle,
    ) -> SignedDuration;
}

/// Charges waiting before the window opens and the service itself at the
/// vehicle type's rates.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaitingDurationCosts;

impl ActivityCost for WaitingDurationCosts {
    fn activity_cost(
        &self,
        activity: &Activity,
        arrival_time: Timestamp,
        _driver: &Driver,
        vehicle: &Vehicle,
    ) -> Cost {
        let vehicle_type = vehicle.vehicle_type();
        let waiting = activity.time_windows().waiting_duration(arrival_time);

        waiting.as_secs_f64() * vehicle_type.cost_per_waiting_time()
            + activity.operation_duration().as_secs_f64() * vehicle_type.cost_per_service_time()
    }

    fn activity_duration(
        &self,
        activity: &Activity,
        _arrival_time: Timestamp,
        _driver: &Driver,
        _vehicle: &Vehicle,
    ) -> SignedDuration {
        activity.operation_duration()
    }
}
