use std::sync::Arc;

use fxhash::FxHashSet;
use jiff::Timestamp;

use crate::{
    error::StateError,
    problem::{
        activity_costs::ActivityCost,
        location::LocationIdx,
        transport_costs::TransportCost,
        vehicle::{Driver, Vehicle},
    },
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    state::{state_key::LATEST_OPERATION_START_TIME, state_store::StateStore},
    updaters::{
        state_updater::StateUpdater,
        visitor::ReverseActivityVisitor,
    },
    utils::time::saturating_sub,
};

/// Vehicles a route is evaluated for.
pub trait VehiclesToUpdate {
    fn vehicles(&self, route: &VehicleRoute) -> Vec<Arc<Vehicle>>;
}

/// Only the vehicle currently serving the route.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteVehicle;

impl VehiclesToUpdate for RouteVehicle {
    fn vehicles(&self, route: &VehicleRoute) -> Vec<Arc<Vehicle>> {
        vec![Arc::clone(route.shared_vehicle())]
    }
}

/// The route vehicle plus one representative of every other vehicle type.
#[derive(Debug, Clone)]
pub struct UniqueVehicleTypes {
    representatives: Vec<Arc<Vehicle>>,
}

impl UniqueVehicleTypes {
    pub fn new(fleet: &[Arc<Vehicle>]) -> Self {
        let mut seen = FxHashSet::default();
        let representatives = fleet
            .iter()
            .filter(|vehicle| seen.insert(vehicle.vehicle_type_idx()))
            .cloned()
            .collect();

        UniqueVehicleTypes { representatives }
    }
}

impl VehiclesToUpdate for UniqueVehicleTypes {
    fn vehicles(&self, route: &VehicleRoute) -> Vec<Arc<Vehicle>> {
        let route_vehicle = route.shared_vehicle();
        let route_type = route_vehicle.vehicle_type_idx();

        std::iter::once(Arc::clone(route_vehicle))
            .chain(
                self.representatives
                    .iter()
                    .filter(|vehicle| vehicle.vehicle_type_idx() != route_type)
                    .cloned(),
            )
            .collect()
    }
}

impl<F> VehiclesToUpdate for F
where
    F: Fn(&VehicleRoute) -> Vec<Arc<Vehicle>>,
{
    fn vehicles(&self, route: &VehicleRoute) -> Vec<Arc<Vehicle>> {
        self(route)
    }
}

/// Backward recurrence state for one vehicle.
struct LatestStartTarget {
    vehicle: Arc<Vehicle>,
    successor_location: LocationIdx,
    latest_at_successor: Timestamp,
}

fn latest_operation_start(
    transport_costs: &dyn TransportCost,
    activity_costs: &dyn ActivityCost,
    target: &LatestStartTarget,
    activity: &Activity,
    driver: &Driver,
) -> Timestamp {
    let travel_time = transport_costs.backward_transport_time(
        activity.location_id(),
        target.successor_location,
        target.latest_at_successor,
        driver,
        &target.vehicle,
    );
    let latest_departure = saturating_sub(target.latest_at_successor, travel_time);
    let duration =
        activity_costs.activity_duration(activity, latest_departure, driver, &target.vehicle);
    let potential_latest = saturating_sub(latest_departure, duration);

    activity.theoretical_latest_start().min(potential_latest)
}

/// Latest operation start of every activity that keeps the rest of the route
/// feasible, computed for each vehicle returned by `V`.
///
/// Values are stored per activity and vehicle type.
pub struct UpdateVehicleDependentLatestStart<V: VehiclesToUpdate> {
    transport_costs: Arc<dyn TransportCost>,
    activity_costs: Arc<dyn ActivityCost>,
    vehicles: V,
    targets: Vec<LatestStartTarget>,
}

impl<V: VehiclesToUpdate> UpdateVehicleDependentLatestStart<V> {
    pub fn new(
        transport_costs: Arc<dyn TransportCost>,
        activity_costs: Arc<dyn ActivityCost>,
        vehicles: V,
    ) -> Self {
        UpdateVehicleDependentLatestStart {
            transport_costs,
            activity_costs,
            vehicles,
            targets: Vec::new(),
        }
    }
}

impl<V: VehiclesToUpdate> ReverseActivityVisitor for UpdateVehicleDependentLatestStart<V> {
    fn begin(&mut self, route: &VehicleRoute, _states: &mut StateStore) -> Result<(), StateError> {
        self.targets = self
            .vehicles
            .vehicles(route)
            .into_iter()
            .map(|vehicle| LatestStartTarget {
                successor_location: vehicle.end_location_id(),
                latest_at_successor: vehicle.latest_arrival(),
                vehicle,
            })
            .collect();
        Ok(())
    }

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        for target in self.targets.iter_mut() {
            let latest = latest_operation_start(
                self.transport_costs.as_ref(),
                self.activity_costs.as_ref(),
                target,
                activity,
                route.driver,
            );

            states.put_internal_vehicle_activity_state(
                activity.index(),
                target.vehicle.vehicle_type_idx(),
                LATEST_OPERATION_START_TIME,
                latest,
            )?;

            target.successor_location = activity.location_id();
            target.latest_at_successor = latest;
        }
        Ok(())
    }

    fn finish(
        &mut self,
        _route: &mut VehicleRoute,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.targets.clear();
        Ok(())
    }
}

impl<V: VehiclesToUpdate> StateUpdater for UpdateVehicleDependentLatestStart<V> {
    fn name(&self) -> &'static str {
        "update_vehicle_dependent_latest_start"
    }

    fn as_backward_visitor(&mut self) -> Option<&mut dyn ReverseActivityVisitor> {
        Some(self)
    }
}

/// Latest operation start of every activity for the route's own vehicle.
pub struct UpdateLatestStart {
    transport_costs: Arc<dyn TransportCost>,
    activity_costs: Arc<dyn ActivityCost>,
    target: Option<LatestStartTarget>,
}

impl UpdateLatestStart {
    pub fn new(transport_costs: Arc<dyn TransportCost>, activity_costs: Arc<dyn ActivityCost>) -> Self {
        UpdateLatestStart {
            transport_costs,
            activity_costs,
            target: None,
        }
    }
}

impl ReverseActivityVisitor for UpdateLatestStart {
    fn begin(&mut self, route: &VehicleRoute, _states: &mut StateStore) -> Result<(), StateError> {
        let vehicle = Arc::clone(route.shared_vehicle());
        self.target = Some(LatestStartTarget {
            successor_location: route.end().location_id(),
            latest_at_successor: route.end().theoretical_latest_start(),
            vehicle,
        });
        Ok(())
    }

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        let Some(target) = self.target.as_mut() else {
            return Ok(());
        };

        let latest = latest_operation_start(
            self.transport_costs.as_ref(),
            self.activity_costs.as_ref(),
            target,
            activity,
            route.driver,
        );
        states.put_internal_activity_state(activity.index(), LATEST_OPERATION_START_TIME, latest)?;

        target.successor_location = activity.location_id();
        target.latest_at_successor = latest;
        Ok(())
    }

    fn finish(
        &mut self,
        _route: &mut VehicleRoute,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.target = None;
        Ok(())
    }
}

impl StateUpdater for UpdateLatestStart {
    fn name(&self) -> &'static str {
        "update_latest_start"
    }

    fn as_backward_visitor(&mut self) -> Option<&mut dyn ReverseActivityVisitor> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        problem::{
            activity_costs::WaitingDurationCosts, travel_cost_matrix::TravelMatrices,
            vehicle::VehicleTypeIdx,
        },
        solution::activity::ActivityIdx,
        test_utils::{self, ts},
        updaters::visitor::visit_backward,
    };

    fn costs() -> (Arc<dyn TransportCost>, Arc<dyn ActivityCost>) {
        (
            Arc::new(TravelMatrices::from_constant(4, 10.0, 10.0)),
            Arc::new(WaitingDurationCosts),
        )
    }

    #[test]
    fn test_latest_start_for_route_vehicle() {
        // Vehicle must be back at the depot at 1000
        let mut route = test_utils::create_timed_route(&[(0, 100), (0, 990)], 5);
        let mut states = test_utils::create_state_store();
        let (transport, activity_costs) = costs();

        let mut updater = UpdateLatestStart::new(transport, activity_costs);
        let mut visitors: [&mut dyn ReverseActivityVisitor; 1] = [&mut updater];
        visit_backward(&mut visitors, &mut route, &mut states).unwrap();

        // Second: min(990, 1000 - 10 - 5)
        assert_eq!(
            states.get_activity_state::<Timestamp>(ActivityIdx::new(2), LATEST_OPERATION_START_TIME),
            Ok(Some(&ts(985)))
        );
        // First: min(100, 985 - 10 - 5)
        assert_eq!(
            states.get_activity_state::<Timestamp>(ActivityIdx::new(1), LATEST_OPERATION_START_TIME),
            Ok(Some(&ts(100)))
        );
    }

    #[test]
    fn test_latest_start_per_vehicle_type() {
        let mut route = test_utils::create_timed_route(&[(0, 2000)], 5);
        let mut states = test_utils::create_state_store();
        let (transport, activity_costs) = costs();

        let other = Arc::new(test_utils::create_vehicle_of_type(1, 0, ts(500)));
        let fleet = vec![Arc::clone(route.shared_vehicle()), other];

        let mut updater = UpdateVehicleDependentLatestStart::new(
            transport,
            activity_costs,
            UniqueVehicleTypes::new(&fleet),
        );
        let mut visitors: [&mut dyn ReverseActivityVisitor; 1] = [&mut updater];
        visit_backward(&mut visitors, &mut route, &mut states).unwrap();

        let latest = |vehicle_type: usize| {
            states
                .get_vehicle_activity_state::<Timestamp>(
                    ActivityIdx::new(1),
                    VehicleTypeIdx::new(vehicle_type),
                    LATEST_OPERATION_START_TIME,
                )
                .unwrap()
                .copied()
        };

        assert_eq!(latest(0), Some(ts(985)));
        assert_eq!(latest(1), Some(ts(485)));
        assert_eq!(
            states.get_activity_state::<Timestamp>(ActivityIdx::new(1), LATEST_OPERATION_START_TIME),
            Ok(None)
        );
    }

    #[test]
    fn test_vehicles_from_closure() {
        let route = test_utils::create_timed_route(&[], 5);
        let vehicles = |route: &VehicleRoute| vec![Arc::clone(route.shared_vehicle())];

        assert_eq!(vehicles.vehicles(&route).len(), 1);
        assert_eq!(RouteVehicle.vehicles(&route).len(), 1);
    }
}
