use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    location::LocationIdx,
    travel_cost_matrix::Cost,
    vehicle::{Driver, Vehicle},
};

/// Travel cost and time between two locations for a given driver and vehicle.
///
/// The forward forms take the departure time at `from`; the backward forms
/// take the arrival time at `to` and are used when walking a route in reverse.
pub trait TransportCost {
    fn transport_cost(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        departure_time: Timestamp,
        driver: &Driver,
        vehicle: &Vehicle,
    ) -> Cost;

    fn transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        departure_time: Timestamp,
        driver: &Driver,
        vehicle: &Vehicle,
    ) -> SignedDuration;

    fn backward_transport_cost(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        arrival_time: Timestamp,
        driver: &Driver,
        vehicle: &Vehicle,
    ) -> Cost;

    fn backward_transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        arrival_time: Timestamp,
        driver: &Driver,
        vehicle: &Vehicle,
    ) -> SignedDuration;
}
