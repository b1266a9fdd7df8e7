use tracing::debug;

use crate::{
    error::StateError,
    problem::{capacity::Capacity, job::JobIdx},
    solution::{
        activity::{Activity, ActivityKind},
        route::{RouteContext, VehicleRoute},
    },
    state::{
        state_key::{LOAD, LOAD_AT_BEGINNING, LOAD_AT_END},
        state_store::StateStore,
    },
    updaters::{
        state_updater::{StateListener, StateUpdater},
        visitor::ActivityVisitor,
    },
};

/// Reads the load on board when the route starts.
pub(crate) fn load_at_beginning(
    route: &VehicleRoute,
    states: &StateStore,
) -> Result<Capacity, StateError> {
    states
        .get_route_state::<Capacity>(route.id(), LOAD_AT_BEGINNING)?
        .cloned()
        .ok_or_else(|| StateError::MissingRouteState {
            key: String::from("load_at_beginning"),
            route: route.id(),
        })
}

pub(crate) fn load_at_end(route: &VehicleRoute, states: &StateStore) -> Result<Capacity, StateError> {
    states
        .get_route_state::<Capacity>(route.id(), LOAD_AT_END)?
        .cloned()
        .ok_or_else(|| StateError::MissingRouteState {
            key: String::from("load_at_end"),
            route: route.id(),
        })
}

/// Running load at every activity.
///
/// As a listener it also computes the load on board at the start of the
/// route (goods to deliver) and at its end (goods picked up).
#[derive(Debug, Default)]
pub struct UpdateLoads {
    current_load: Capacity,
}

impl UpdateLoads {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_route_loads(route: &VehicleRoute, states: &mut StateStore) -> Result<(), StateError> {
        let mut at_beginning = Capacity::empty();
        let mut changes = Capacity::empty();

        for activity in route.activities() {
            if activity.kind() == ActivityKind::Delivery {
                at_beginning = &at_beginning - activity.load_change();
            }
            changes = &changes + activity.load_change();
        }

        // With complete shipments this is the sum of everything picked up
        let at_end = &at_beginning + &changes;

        states.put_internal_route_state(route.id(), LOAD_AT_BEGINNING, at_beginning)?;
        states.put_internal_route_state(route.id(), LOAD_AT_END, at_end)?;

        Ok(())
    }
}

impl ActivityVisitor for UpdateLoads {
    fn begin(&mut self, route: &VehicleRoute, states: &mut StateStore) -> Result<(), StateError> {
        self.current_load = load_at_beginning(route, states)?;
        Ok(())
    }

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.current_load = &self.current_load + activity.load_change();

        let capacity = route.vehicle.capacity();
        if !self.current_load.is_less_or_equal(capacity)
            || !self.current_load.is_greater_or_equal(&Capacity::EMPTY)
        {
            debug!(
                route = %route.id,
                activity = %activity.index(),
                load = %self.current_load,
                capacity = %capacity,
                "Load outside of vehicle capacity"
            );
        }

        states.put_internal_activity_state(activity.index(), LOAD, self.current_load.clone())
    }

    fn finish(
        &mut self,
        _route: &mut VehicleRoute,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.current_load = Capacity::empty();
        Ok(())
    }
}

impl StateListener for UpdateLoads {
    fn insertion_starts(
        &mut self,
        routes: &[VehicleRoute],
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        for route in routes {
            Self::update_route_loads(route, states)?;
        }
        Ok(())
    }

    fn job_inserted(
        &mut self,
        route: &VehicleRoute,
        _job_id: JobIdx,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        Self::update_route_loads(route, states)
    }

    fn job_removed(
        &mut self,
        route: &VehicleRoute,
        _job_id: JobIdx,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        Self::update_route_loads(route, states)
    }
}

impl StateUpdater for UpdateLoads {
    fn name(&self) -> &'static str {
        "update_loads"
    }

    fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
        Some(self)
    }

    fn as_listener(&mut self) -> Option<&mut dyn StateListener> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solution::activity::ActivityIdx,
        test_utils,
        updaters::visitor::visit_forward,
    };

    fn loads(route: &VehicleRoute, states: &StateStore) -> Vec<Capacity> {
        route
            .activities()
            .iter()
            .map(|activity| {
                states
                    .get_activity_state::<Capacity>(activity.index(), LOAD)
                    .unwrap()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn run(route: &mut VehicleRoute, states: &mut StateStore) -> Result<(), StateError> {
        let mut updater = UpdateLoads::new();
        updater.insertion_starts(std::slice::from_ref(route), states)?;

        let mut visitors: [&mut dyn ActivityVisitor; 1] = [&mut updater];
        visit_forward(&mut visitors, route, states)
    }

    #[test]
    fn test_running_loads() {
        let mut route = test_utils::create_route_with_loads(&[10, -10, 0]);
        let mut states = test_utils::create_state_store();

        run(&mut route, &mut states).unwrap();

        assert_eq!(
            loads(&route, &states),
            vec![
                Capacity::from_vec(vec![10]),
                Capacity::from_vec(vec![0]),
                Capacity::from_vec(vec![0]),
            ]
        );
    }

    #[test]
    fn test_capacity_violation_is_recorded_not_raised() {
        // Vehicle capacity is 15
        let mut route = test_utils::create_route_with_loads(&[20, -10, 0]);
        let mut states = test_utils::create_state_store();

        assert!(run(&mut route, &mut states).is_ok());
        assert_eq!(loads(&route, &states)[0], Capacity::from_vec(vec![20]));
    }

    #[test]
    fn test_route_loads_from_deliveries_and_pickups() {
        let mut route = test_utils::create_route_with_kinds(&[
            (ActivityKind::Delivery, -4),
            (ActivityKind::Pickup, 3),
            (ActivityKind::Delivery, -2),
        ]);
        let mut states = test_utils::create_state_store();

        run(&mut route, &mut states).unwrap();

        assert_eq!(
            states.get_route_state::<Capacity>(route.id(), LOAD_AT_BEGINNING),
            Ok(Some(&Capacity::from_vec(vec![6])))
        );
        assert_eq!(
            states.get_route_state::<Capacity>(route.id(), LOAD_AT_END),
            Ok(Some(&Capacity::from_vec(vec![3])))
        );
        assert_eq!(
            loads(&route, &states),
            vec![
                Capacity::from_vec(vec![2]),
                Capacity::from_vec(vec![5]),
                Capacity::from_vec(vec![3]),
            ]
        );
    }

    #[test]
    fn test_missing_load_at_beginning_is_an_error() {
        let mut route = test_utils::create_route_with_loads(&[10]);
        let mut states = test_utils::create_state_store();
        let mut updater = UpdateLoads::new();
        let mut visitors: [&mut dyn ActivityVisitor; 1] = [&mut updater];

        let result = visit_forward(&mut visitors, &mut route, &mut states);

        assert_eq!(
            result,
            Err(StateError::MissingRouteState {
                key: String::from("load_at_beginning"),
                route: route.id(),
            })
        );
        assert_eq!(
            states.get_activity_state::<Capacity>(ActivityIdx::new(1), LOAD),
            Ok(None)
        );
    }
}
