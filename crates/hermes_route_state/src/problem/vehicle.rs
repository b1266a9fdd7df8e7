use std::sync::Arc;

use jiff::Timestamp;
use serde::Serialize;

use crate::{define_index_newtype, problem::location::LocationIdx};

use super::capacity::Capacity;

define_index_newtype!(VehicleTypeIdx, VehicleType);

/// Capacity and cost profile shared by every vehicle of the same type.
#[derive(Serialize, Debug, Clone)]
pub struct VehicleType {
    external_id: String,
    index: VehicleTypeIdx,
    capacity: Capacity,
    cost_per_distance: f64,
    cost_per_time: f64,
    cost_per_waiting_time: f64,
    cost_per_service_time: f64,
}

impl VehicleType {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn index(&self) -> VehicleTypeIdx {
        self.index
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn cost_per_distance(&self) -> f64 {
        self.cost_per_distance
    }

    pub fn cost_per_time(&self) -> f64 {
        self.cost_per_time
    }

    pub fn cost_per_waiting_time(&self) -> f64 {
        self.cost_per_waiting_time
    }

    pub fn cost_per_service_time(&self) -> f64 {
        self.cost_per_service_time
    }
}

#[derive(Default)]
pub struct VehicleTypeBuilder {
    external_id: Option<String>,
    index: Option<usize>,
    capacity: Option<Capacity>,
    cost_per_distance: Option<f64>,
    cost_per_time: Option<f64>,
    cost_per_waiting_time: Option<f64>,
    cost_per_service_time: Option<f64>,
}

impl VehicleTypeBuilder {
    pub fn set_type_id(&mut self, external_id: String) -> &mut VehicleTypeBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_index(&mut self, index: usize) -> &mut VehicleTypeBuilder {
        self.index = Some(index);
        self
    }

    pub fn set_capacity(&mut self, capacity: Capacity) -> &mut VehicleTypeBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_cost_per_distance(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_distance = Some(cost);
        self
    }

    pub fn set_cost_per_time(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_time = Some(cost);
        self
    }

    pub fn set_cost_per_waiting_time(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_waiting_time = Some(cost);
        self
    }

    pub fn set_cost_per_service_time(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_service_time = Some(cost);
        self
    }

    pub fn build(self) -> VehicleType {
        VehicleType {
            external_id: self.external_id.expect("Vehicle type ID is required"),
            index: self.index.expect("Vehicle type index is required").into(),
            capacity: self.capacity.unwrap_or(Capacity::EMPTY),
            cost_per_distance: self.cost_per_distance.unwrap_or(1.0),
            cost_per_time: self.cost_per_time.unwrap_or(0.0),
            cost_per_waiting_time: self.cost_per_waiting_time.unwrap_or(0.0),
            cost_per_service_time: self.cost_per_service_time.unwrap_or(0.0),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    vehicle_type: Arc<VehicleType>,
    start_location_id: LocationIdx,
    end_location_id: LocationIdx,
    earliest_start: Timestamp,
    latest_arrival: Timestamp,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn vehicle_type(&self) -> &VehicleType {
        &self.vehicle_type
    }

    pub fn vehicle_type_idx(&self) -> VehicleTypeIdx {
        self.vehicle_type.index()
    }

    pub fn capacity(&self) -> &Capacity {
        self.vehicle_type.capacity()
    }

    pub fn start_location_id(&self) -> LocationIdx {
        self.start_location_id
    }

    pub fn end_location_id(&self) -> LocationIdx {
        self.end_location_id
    }

    pub fn earliest_start(&self) -> Timestamp {
        self.earliest_start
    }

    pub fn latest_arrival(&self) -> Timestamp {
        self.latest_arrival
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    vehicle_type: Option<Arc<VehicleType>>,
    start_location_id: Option<usize>,
    end_location_id: Option<usize>,
    earliest_start: Option<Timestamp>,
    latest_arrival: Option<Timestamp>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: String) -> &mut VehicleBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_vehicle_type(&mut self, vehicle_type: Arc<VehicleType>) -> &mut VehicleBuilder {
        self.vehicle_type = Some(vehicle_type);
        self
    }

    pub fn set_start_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(location_id);
        self
    }

    /// Defaults to the start location.
    pub fn set_end_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.end_location_id = Some(location_id);
        self
    }

    pub fn set_earliest_start(&mut self, earliest_start: Timestamp) -> &mut VehicleBuilder {
        self.earliest_start = Some(earliest_start);
        self
    }

    pub fn set_latest_arrival(&mut self, latest_arrival: Timestamp) -> &mut VehicleBuilder {
        self.latest_arrival = Some(latest_arrival);
        self
    }

    pub fn build(self) -> Vehicle {
        let start_location_id = self
            .start_location_id
            .expect("Start location is required");

        Vehicle {
            external_id: self.external_id.expect("External ID is required"),
            vehicle_type: self.vehicle_type.expect("Vehicle type is required"),
            start_location_id: start_location_id.into(),
            end_location_id: self.end_location_id.unwrap_or(start_location_id).into(),
            earliest_start: self.earliest_start.unwrap_or(Timestamp::UNIX_EPOCH),
            latest_arrival: self.latest_arrival.unwrap_or(Timestamp::MAX),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    external_id: String,
}

impl Driver {
    pub fn new(external_id: String) -> Self {
        Driver { external_id }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new(String::from("default_driver"))
    }
}
