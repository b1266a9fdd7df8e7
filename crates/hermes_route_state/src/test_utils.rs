use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};

use crate::{
    problem::{
        activity_costs::WaitingDurationCosts,
        capacity::Capacity,
        location::Location,
        time_window::TimeWindow,
        travel_cost_matrix::TravelMatrices,
        vehicle::{Driver, Vehicle, VehicleBuilder, VehicleType, VehicleTypeBuilder},
    },
    solution::{
        activity::{Activity, ActivityBuilder, ActivityKind},
        route::VehicleRoute,
    },
    state::{state_manager::StateManager, state_params::StateParams, state_store::StateStore},
};

/// Every fixture route is served from location 0 by a vehicle of this capacity.
pub const TEST_CAPACITY: i32 = 15;

pub fn ts(seconds: i64) -> Timestamp {
    Timestamp::from_second(seconds).unwrap()
}

pub fn create_location_grid(rows: usize, cols: usize) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            let location = Location::from_cartesian(x as f64, y as f64);
            locations.push(location);
        }
    }

    locations
}

pub fn create_vehicle_type(index: usize) -> VehicleType {
    let mut builder = VehicleTypeBuilder::default();
    builder
        .set_type_id(format!("type_{index}"))
        .set_index(index)
        .set_capacity(Capacity::from_vec(vec![TEST_CAPACITY]))
        .set_cost_per_distance(1.0)
        .set_cost_per_time(0.5)
        .set_cost_per_waiting_time(1.0);
    builder.build()
}

pub fn create_vehicle_with_rates(cost_per_distance: f64, cost_per_time: f64) -> Vehicle {
    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type
        .set_type_id(String::from("rates"))
        .set_index(0)
        .set_cost_per_distance(cost_per_distance)
        .set_cost_per_time(cost_per_time);

    let mut builder = VehicleBuilder::default();
    builder
        .set_vehicle_id(String::from("vehicle"))
        .set_vehicle_type(Arc::new(vehicle_type.build()))
        .set_start_location_id(0);
    builder.build()
}

pub fn create_vehicle_of_type(
    vehicle_type: usize,
    location_id: usize,
    latest_arrival: Timestamp,
) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder
        .set_vehicle_id(format!("vehicle_{vehicle_type}"))
        .set_vehicle_type(Arc::new(create_vehicle_type(vehicle_type)))
        .set_start_location_id(location_id)
        .set_earliest_start(ts(0))
        .set_latest_arrival(latest_arrival);
    builder.build()
}

pub fn create_empty_route() -> VehicleRoute {
    VehicleRoute::empty(
        Arc::new(create_vehicle_of_type(0, 0, ts(1000))),
        Arc::new(Driver::default()),
    )
}

/// Shipment pickup for positive amounts, shipment delivery for negative
/// ones and a plain service otherwise.
pub fn create_activity(index: i32, location_id: usize, load: i32) -> Activity {
    let kind = match load {
        l if l > 0 => ActivityKind::ShipmentPickup,
        l if l < 0 => ActivityKind::ShipmentDelivery,
        _ => ActivityKind::Service,
    };
    create_activity_of_kind(index, location_id, kind, load)
}

pub fn create_activity_of_kind(
    index: i32,
    location_id: usize,
    kind: ActivityKind,
    load: i32,
) -> Activity {
    let mut builder = ActivityBuilder::default();
    builder
        .set_index(index)
        .set_kind(kind)
        .set_job_id(index as usize - 1)
        .set_location_id(location_id)
        .set_load_change(Capacity::from_vec(vec![load]));
    builder.build()
}

/// Activity `i` has index `i + 1` and is located at `i + 1`.
pub fn create_route_with_kinds(activities: &[(ActivityKind, i32)]) -> VehicleRoute {
    let mut route = create_empty_route();

    for (i, &(kind, load)) in activities.iter().enumerate() {
        route.push(create_activity_of_kind(i as i32 + 1, i + 1, kind, load));
    }

    route
}

pub fn create_route_with_loads(loads: &[i32]) -> VehicleRoute {
    let mut route = create_empty_route();

    for (i, &load) in loads.iter().enumerate() {
        route.push(create_activity(i as i32 + 1, i + 1, load));
    }

    route
}

pub fn create_route_with_skills(skills: &[&[&str]]) -> VehicleRoute {
    let mut route = create_empty_route();

    for (i, required) in skills.iter().enumerate() {
        let mut builder = ActivityBuilder::default();
        builder
            .set_index(i as i32 + 1)
            .set_job_id(i)
            .set_location_id(i + 1)
            .set_required_skills(required.iter().map(|skill| skill.to_string()).collect());
        route.push(builder.build());
    }

    route
}

/// Services with one time window each, given in seconds.
///
/// The vehicle leaves location 0 at 0 and must be back by 1000.
pub fn create_timed_route(windows: &[(i64, i64)], service_seconds: i64) -> VehicleRoute {
    let mut route = create_empty_route();

    for (i, &(start, end)) in windows.iter().enumerate() {
        let mut builder = ActivityBuilder::default();
        builder
            .set_index(i as i32 + 1)
            .set_job_id(i)
            .set_location_id(i + 1)
            .set_operation_duration(SignedDuration::from_secs(service_seconds))
            .set_time_window(TimeWindow::new(Some(ts(start)), Some(ts(end))));
        route.push(builder.build());
    }

    route
}

pub fn create_state_store() -> StateStore {
    StateStore::new(&StateParams::default())
}

/// 10 seconds and 10 distance units between any two of 16 locations.
pub fn create_state_manager() -> StateManager {
    StateManager::new(
        StateParams::default(),
        Arc::new(TravelMatrices::from_constant(16, 10.0, 10.0)),
        Arc::new(WaitingDurationCosts),
    )
}
