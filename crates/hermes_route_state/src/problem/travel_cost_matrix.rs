use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use serde::Deserialize;

use crate::problem::{
    location::{Location, LocationIdx},
    transport_costs::TransportCost,
    vehicle::{Driver, Vehicle},
};

pub type Distance = f64;
pub type Time = f64;
pub type Cost = f64;

/// Time-independent distance and time matrices stored flat.
///
/// The entry for a pair of locations lives at `from * num_locations + to`.
/// Costs are derived from the vehicle type's per-distance and per-time rates.
#[derive(Deserialize, Clone)]
pub struct TravelMatrices {
    distances: Arc<Vec<Distance>>,
    times: Arc<Vec<Time>>,
    num_locations: usize,
}

impl TravelMatrices {
    pub fn new(distances: Vec<Vec<Distance>>, times: Vec<Vec<Time>>) -> Self {
        let num_locations = distances.len();

        TravelMatrices {
            distances: Arc::new(distances.into_iter().flatten().collect()),
            times: Arc::new(times.into_iter().flatten().collect()),
            num_locations,
        }
    }

    /// Times equal distances, one unit per second.
    pub fn from_euclidean(locations: &[Location]) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                distances[i * num_locations + j] = from.euclidean_distance(to);
            }
        }

        let distances = Arc::new(distances);
        let times = Arc::clone(&distances);

        TravelMatrices {
            distances,
            times,
            num_locations,
        }
    }

    pub fn from_constant(num_locations: usize, time: Time, distance: Distance) -> Self {
        TravelMatrices {
            distances: Arc::new(vec![distance; num_locations * num_locations]),
            times: Arc::new(vec![time; num_locations * num_locations]),
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        SignedDuration::from_secs_f64(self.times[self.index(from, to)])
    }

    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx, vehicle: &Vehicle) -> Cost {
        let vehicle_type = vehicle.vehicle_type();
        self.travel_distance(from, to) * vehicle_type.cost_per_distance()
            + self.travel_time(from, to).as_secs_f64() * vehicle_type.cost_per_time()
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}

impl TransportCost for TravelMatrices {
    fn transport_cost(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        _departure_time: Timestamp,
        _driver: &Driver,
        vehicle: &Vehicle,
    ) -> Cost {
        self.travel_cost(from, to, vehicle)
    }

    fn transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        _departure_time: Timestamp,
        _driver: &Driver,
        _vehicle: &Vehicle,
    ) -> SignedDuration {
        self.travel_time(from, to)
    }

    fn backward_transport_cost(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        _arrival_time: Timestamp,
        _driver: &Driver,
        vehicle: &Vehicle,
    ) -> Cost {
        self.travel_cost(from, to, vehicle)
    }

    fn backward_transport_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
        _arrival_time: Timestamp,
        _driver: &Driver,
        _vehicle: &Vehicle,
    ) -> SignedDuration {
        self.travel_time(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_euclidean_matrices() {
        let locations = test_utils::create_location_grid(1, 4);
        let matrices = TravelMatrices::from_euclidean(&locations);

        assert_eq!(matrices.num_locations(), 4);
        assert_eq!(matrices.travel_distance(0.into(), 3.into()), 3.0);
        assert_eq!(
            matrices.travel_time(1.into(), 3.into()),
            SignedDuration::from_secs(2)
        );
        assert_eq!(matrices.travel_time(2.into(), 2.into()), SignedDuration::ZERO);
    }

    #[test]
    fn test_cost_uses_vehicle_type_rates() {
        let matrices = TravelMatrices::from_constant(3, 60.0, 1000.0);
        let vehicle = test_utils::create_vehicle_with_rates(2.0, 0.5);

        // 1000 * 2.0 + 60 * 0.5
        assert_eq!(matrices.travel_cost(0.into(), 1.into(), &vehicle), 2030.0);
        assert_eq!(matrices.travel_cost(1.into(), 1.into(), &vehicle), 0.0);
    }
}
