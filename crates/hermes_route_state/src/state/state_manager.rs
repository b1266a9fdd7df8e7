use std::sync::Arc;

use tracing::{Level, debug, instrument, warn};

use crate::{
    error::StateError,
    problem::{activity_costs::ActivityCost, job::JobIdx, transport_costs::TransportCost},
    solution::route::VehicleRoute,
    state::{state_key::StateKey, state_params::StateParams, state_store::StateStore},
    timer_debug,
    updaters::{
        activity_start_policy::ActivityStartPolicy,
        state_updater::{StateListener, StateUpdater, UpdaterRoles},
        update_activity_times::UpdateActivityTimes,
        update_latest_start::{UpdateLatestStart, UpdateVehicleDependentLatestStart, VehiclesToUpdate},
        update_loads::UpdateLoads,
        update_max_load::{UpdateMaxLoadLookingBackward, UpdateMaxLoadLookingForward},
        update_skills::UpdateSkills,
        update_variable_costs::UpdateVariableCosts,
        visitor::{ActivityVisitor, ReverseActivityVisitor, visit_backward, visit_forward},
    },
};

struct RegisteredUpdater {
    updater: Box<dyn StateUpdater>,
    roles: UpdaterRoles,
}

#[derive(Default)]
struct BuiltinRegistrations {
    loads: bool,
    time_windows: bool,
    costs: bool,
    skills: bool,
}

/// Owns the state store of one solve and keeps it in sync with the routes.
///
/// Updaters are registered once. The search driver then reports what it does
/// to the routes and the manager re-runs the traversals that are affected:
/// listeners first, then every forward visitor in registration order, then
/// every backward visitor in registration order.
pub struct StateManager {
    params: StateParams,
    states: StateStore,
    updaters: Vec<RegisteredUpdater>,

    transport_costs: Arc<dyn TransportCost>,
    activity_costs: Arc<dyn ActivityCost>,
    start_policy: Arc<dyn ActivityStartPolicy>,

    builtins: BuiltinRegistrations,
}

impl StateManager {
    pub fn new(
        params: StateParams,
        transport_costs: Arc<dyn TransportCost>,
        activity_costs: Arc<dyn ActivityCost>,
    ) -> Self {
        StateManager {
            states: StateStore::new(&params),
            start_policy: Arc::new(params.activity_start_strategy),
            params,
            updaters: Vec::new(),
            transport_costs,
            activity_costs,
            builtins: BuiltinRegistrations::default(),
        }
    }

    pub fn params(&self) -> &StateParams {
        &self.params
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut StateStore {
        &mut self.states
    }

    pub fn get_or_create_key(&mut self, name: &str) -> Result<StateKey, StateError> {
        self.states.get_or_create_key(name)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Wires the updater into every role it declares and returns them.
    pub fn add_state_updater(&mut self, mut updater: Box<dyn StateUpdater>) -> UpdaterRoles {
        let roles = UpdaterRoles::of(updater.as_mut());

        if roles.is_empty() {
            warn!(updater = updater.name(), "State updater declares no role, ignoring it");
            return roles;
        }

        debug!(
            updater = updater.name(),
            forward = roles.forward,
            backward = roles.backward,
            listener = roles.listener,
            "Registering state updater"
        );
        self.updaters.push(RegisteredUpdater { updater, roles });

        roles
    }

    pub fn updater_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.updaters
            .iter()
            .map(|registered| registered.updater.name())
    }

    /// Loads per activity plus the maximum loads in both directions.
    pub fn update_load_states(&mut self) {
        if std::mem::replace(&mut self.builtins.loads, true) {
            return;
        }

        self.add_state_updater(Box::new(UpdateLoads::new()));
        self.add_state_updater(Box::new(UpdateMaxLoadLookingBackward::new()));
        self.add_state_updater(Box::new(UpdateMaxLoadLookingForward::new()));
    }

    /// Activity times and latest operation starts, the latter for the route
    /// vehicle and for every vehicle returned by `vehicles`.
    pub fn update_time_window_states<V>(&mut self, vehicles: V)
    where
        V: VehiclesToUpdate + 'static,
    {
        if std::mem::replace(&mut self.builtins.time_windows, true) {
            return;
        }

        self.add_state_updater(Box::new(UpdateActivityTimes::new(
            Arc::clone(&self.transport_costs),
            Arc::clone(&self.activity_costs),
            Arc::clone(&self.start_policy),
        )));
        self.add_state_updater(Box::new(UpdateLatestStart::new(
            Arc::clone(&self.transport_costs),
            Arc::clone(&self.activity_costs),
        )));
        self.add_state_updater(Box::new(UpdateVehicleDependentLatestStart::new(
            Arc::clone(&self.transport_costs),
            Arc::clone(&self.activity_costs),
            vehicles,
        )));
    }

    pub fn update_cost_states(&mut self) {
        if std::mem::replace(&mut self.builtins.costs, true) {
            return;
        }

        self.add_state_updater(Box::new(UpdateVariableCosts::new(
            Arc::clone(&self.transport_costs),
            Arc::clone(&self.activity_costs),
            Arc::clone(&self.start_policy),
        )));
    }

    pub fn update_skill_states(&mut self) {
        if std::mem::replace(&mut self.builtins.skills, true) {
            return;
        }

        self.add_state_updater(Box::new(UpdateSkills::new()));
    }

    /// Forgets every solution state computed in the previous iteration.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn iteration_starts(
        &mut self,
        iteration: usize,
        routes: &[VehicleRoute],
    ) -> Result<(), StateError> {
        self.states.clear();

        for listener in listeners(&mut self.updaters) {
            listener.iteration_starts(iteration, routes, &mut self.states)?;
        }
        Ok(())
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insertion_starts(&mut self, routes: &mut [VehicleRoute]) -> Result<(), StateError> {
        for listener in listeners(&mut self.updaters) {
            listener.insertion_starts(routes, &mut self.states)?;
        }

        timer_debug!("Updated states of all routes", {
            for route in routes.iter_mut() {
                update_route_states(&mut self.updaters, route, &mut self.states)?;
            }
        });

        Ok(())
    }

    pub fn job_inserted(
        &mut self,
        route: &mut VehicleRoute,
        job_id: JobIdx,
    ) -> Result<(), StateError> {
        for listener in listeners(&mut self.updaters) {
            listener.job_inserted(route, job_id, &mut self.states)?;
        }

        update_route_states(&mut self.updaters, route, &mut self.states)
    }

    pub fn job_removed(&mut self, route: &mut VehicleRoute, job_id: JobIdx) -> Result<(), StateError> {
        for listener in listeners(&mut self.updaters) {
            listener.job_removed(route, job_id, &mut self.states)?;
        }

        update_route_states(&mut self.updaters, route, &mut self.states)
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insertion_ends(&mut self, routes: &[VehicleRoute]) -> Result<(), StateError> {
        for listener in listeners(&mut self.updaters) {
            listener.insertion_ends(routes, &mut self.states)?;
        }
        Ok(())
    }

    /// Runs both traversals over one route without notifying listeners.
    pub fn update_route(&mut self, route: &mut VehicleRoute) -> Result<(), StateError> {
        update_route_states(&mut self.updaters, route, &mut self.states)
    }
}

fn listeners<'a>(
    updaters: &'a mut [RegisteredUpdater],
) -> impl Iterator<Item = &'a mut dyn StateListener> {
    updaters
        .iter_mut()
        .filter(|registered| registered.roles.listener)
        .filter_map(|registered| registered.updater.as_listener())
}

fn update_route_states(
    updaters: &mut [RegisteredUpdater],
    route: &mut VehicleRoute,
    states: &mut StateStore,
) -> Result<(), StateError> {
    {
        let mut visitors: Vec<&mut dyn ActivityVisitor> = updaters
            .iter_mut()
            .filter(|registered| registered.roles.forward)
            .filter_map(|registered| registered.updater.as_forward_visitor())
            .collect();
        visit_forward(&mut visitors, route, states)?;
    }

    let mut visitors: Vec<&mut dyn ReverseActivityVisitor> = updaters
        .iter_mut()
        .filter(|registered| registered.roles.backward)
        .filter_map(|registered| registered.updater.as_backward_visitor())
        .collect();
    visit_backward(&mut visitors, route, states)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use jiff::Timestamp;

    use super::*;
    use crate::{
        problem::{capacity::Capacity, skill::Skills},
        problem::vehicle::Driver,
        solution::{
            activity::{Activity, ActivityIdx, ActivityKind},
            route::RouteContext,
        },
        state::state_key::{
            COSTS, FUTURE_MAX_LOAD, LATEST_OPERATION_START_TIME, LOAD, LOAD_AT_BEGINNING,
            LOAD_AT_END, SKILLS,
        },
        test_utils::{self, ts},
        updaters::update_latest_start::RouteVehicle,
    };

    /// Share of the vehicle capacity used at each activity, read from the
    /// loads written earlier in the same pass.
    struct LoadShare {
        key: StateKey,
    }

    impl ActivityVisitor for LoadShare {
        fn begin(&mut self, _route: &VehicleRoute, _states: &mut StateStore) -> Result<(), StateError> {
            Ok(())
        }

        fn visit(
            &mut self,
            route: &RouteContext<'_>,
            activity: &mut Activity,
            states: &mut StateStore,
        ) -> Result<(), StateError> {
            let load = states
                .get_activity_state::<Capacity>(activity.index(), LOAD)?
                .cloned()
                .unwrap_or_default();
            let share = load.divide(route.vehicle.capacity())?;

            states.put_activity_state(activity.index(), self.key, share)
        }

        fn finish(
            &mut self,
            _route: &mut VehicleRoute,
            _states: &mut StateStore,
        ) -> Result<(), StateError> {
            Ok(())
        }
    }

    impl StateUpdater for LoadShare {
        fn name(&self) -> &'static str {
            "load_share"
        }

        fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
            Some(self)
        }
    }

    /// Records the lifecycle events it receives.
    struct EventLog {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl StateListener for EventLog {
        fn iteration_starts(
            &mut self,
            iteration: usize,
            _routes: &[VehicleRoute],
            _states: &mut StateStore,
        ) -> Result<(), StateError> {
            self.events.borrow_mut().push(format!("iteration {iteration}"));
            Ok(())
        }

        fn job_inserted(
            &mut self,
            route: &VehicleRoute,
            job_id: JobIdx,
            states: &mut StateStore,
        ) -> Result<(), StateError> {
            // Listeners run before the traversals of the same event
            let has_load = states.has_activity_state(ActivityIdx::new(2), LOAD)?;
            self.events
                .borrow_mut()
                .push(format!("inserted {job_id} into {} ({has_load})", route.len()));
            Ok(())
        }

        fn insertion_ends(
            &mut self,
            routes: &[VehicleRoute],
            _states: &mut StateStore,
        ) -> Result<(), StateError> {
            self.events
                .borrow_mut()
                .push(format!("insertion ends on {}", routes.len()));
            Ok(())
        }
    }

    impl StateUpdater for EventLog {
        fn name(&self) -> &'static str {
            "event_log"
        }

        fn as_listener(&mut self) -> Option<&mut dyn StateListener> {
            Some(self)
        }
    }

    struct NoRole;

    impl StateUpdater for NoRole {
        fn name(&self) -> &'static str {
            "no_role"
        }
    }

    fn load_at(manager: &StateManager, activity: i32) -> Option<i32> {
        manager
            .states()
            .get_activity_state::<Capacity>(ActivityIdx::new(activity), LOAD)
            .unwrap()
            .map(|load| load.get(0))
    }

    #[test]
    fn test_builtin_registration_happens_once() {
        let mut manager = test_utils::create_state_manager();

        manager.update_load_states();
        manager.update_load_states();
        manager.update_skill_states();
        manager.update_cost_states();
        manager.update_time_window_states(RouteVehicle);
        manager.update_time_window_states(RouteVehicle);

        assert_eq!(
            manager.updater_names().collect::<Vec<_>>(),
            vec![
                "update_loads",
                "update_max_load_looking_backward",
                "update_max_load_looking_forward",
                "update_skills",
                "update_variable_costs",
                "update_activity_times",
                "update_latest_start",
                "update_vehicle_dependent_latest_start",
            ]
        );
    }

    #[test]
    fn test_roles_are_reported() {
        let mut manager = test_utils::create_state_manager();

        assert_eq!(
            manager.add_state_updater(Box::new(UpdateLoads::new())),
            UpdaterRoles {
                forward: true,
                backward: false,
                listener: true,
            }
        );
        assert_eq!(
            manager.add_state_updater(Box::new(UpdateMaxLoadLookingForward::new())),
            UpdaterRoles {
                forward: false,
                backward: true,
                listener: false,
            }
        );
        assert!(manager.add_state_updater(Box::new(NoRole)).is_empty());
        assert_eq!(manager.updater_names().count(), 2);
    }

    #[test]
    fn test_insertion_starts_updates_every_route() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();

        let mut routes = vec![
            test_utils::create_route_with_loads(&[10, -10, 0]),
            test_utils::create_empty_route(),
        ];
        manager.insertion_starts(&mut routes).unwrap();

        assert_eq!(load_at(&manager, 1), Some(10));
        assert_eq!(load_at(&manager, 2), Some(0));
        assert_eq!(load_at(&manager, 3), Some(0));
        assert_eq!(
            manager
                .states()
                .get_route_state::<Capacity>(routes[1].id(), LOAD_AT_BEGINNING),
            Ok(Some(&Capacity::empty()))
        );
    }

    #[test]
    fn test_job_inserted_updates_modified_route() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();
        manager.update_time_window_states(RouteVehicle);

        let mut other = test_utils::create_empty_route();
        other.push(test_utils::create_activity(5, 5, 2));

        let mut routes = vec![test_utils::create_route_with_loads(&[10]), other];
        manager.insertion_starts(&mut routes).unwrap();
        assert_eq!(load_at(&manager, 2), None);

        // Changed without notifying the manager, must keep its states
        routes[1].push(test_utils::create_activity(6, 6, 4));
        let other_end_arrival = routes[1].end().arrival_time();

        let route = &mut routes[0];
        route.insert(0, test_utils::create_activity(2, 2, 3));
        manager.job_inserted(route, JobIdx::new(1)).unwrap();

        assert_eq!(load_at(&manager, 2), Some(3));
        assert_eq!(load_at(&manager, 1), Some(13));
        assert_eq!(route.activities()[1].arrival_time(), ts(20));
        assert_eq!(route.end().arrival_time(), ts(30));
        assert_eq!(
            manager
                .states()
                .get_activity_state::<Capacity>(ActivityIdx::new(2), FUTURE_MAX_LOAD),
            Ok(Some(&Capacity::from_vec(vec![13])))
        );

        assert_eq!(load_at(&manager, 5), Some(2));
        assert_eq!(load_at(&manager, 6), None);
        assert_eq!(
            manager
                .states()
                .get_route_state::<Capacity>(routes[1].id(), LOAD_AT_END),
            Ok(Some(&Capacity::from_vec(vec![2])))
        );
        assert_eq!(routes[1].end().arrival_time(), other_end_arrival);
        assert_eq!(other_end_arrival, ts(20));
    }

    #[test]
    fn test_equal_routes_keep_separate_route_states() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();
        manager.update_cost_states();

        let mut routes = vec![test_utils::create_route_with_kinds(&[(ActivityKind::Delivery, -4)])];
        manager.insertion_starts(&mut routes).unwrap();

        let route_state = |manager: &StateManager, route: &VehicleRoute| {
            let states = manager.states();
            (
                states.get_route_state::<f64>(route.id(), COSTS).unwrap().copied(),
                states
                    .get_route_state::<Capacity>(route.id(), LOAD_AT_BEGINNING)
                    .unwrap()
                    .cloned(),
            )
        };
        let original = route_state(&manager, &routes[0]);
        assert_eq!(original, (Some(30.0), Some(Capacity::from_vec(vec![4]))));

        let mut candidate = routes[0].clone();
        candidate.push(test_utils::create_activity_of_kind(
            2,
            2,
            ActivityKind::Delivery,
            -3,
        ));
        manager.job_inserted(&mut candidate, JobIdx::new(1)).unwrap();

        assert_eq!(
            route_state(&manager, &candidate),
            (Some(45.0), Some(Capacity::from_vec(vec![7])))
        );
        assert_eq!(route_state(&manager, &routes[0]), original);
    }

    #[test]
    fn test_job_removed_updates_modified_route() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();

        let mut routes = vec![test_utils::create_route_with_loads(&[4, 6, -6])];
        manager.insertion_starts(&mut routes).unwrap();
        assert_eq!(load_at(&manager, 3), Some(4));

        let route = &mut routes[0];
        let job_id = JobIdx::new(1);
        route.remove_job(job_id);
        manager.job_removed(route, job_id).unwrap();

        assert_eq!(load_at(&manager, 3), Some(-2));
    }

    #[test]
    fn test_iteration_starts_clears_states() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();
        manager.update_cost_states();

        let mut routes = vec![test_utils::create_route_with_loads(&[10, -10])];
        manager.insertion_starts(&mut routes).unwrap();
        assert!(load_at(&manager, 1).is_some());

        manager.iteration_starts(1, &routes).unwrap();

        assert_eq!(load_at(&manager, 1), None);
        assert_eq!(
            manager.states().get_route_state::<f64>(routes[0].id(), COSTS),
            Ok(None)
        );
    }

    #[test]
    fn test_custom_updater_reads_states_of_earlier_updaters() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();
        let key = manager.get_or_create_key("load_share").unwrap();
        manager.add_state_updater(Box::new(LoadShare { key }));

        let mut routes = vec![test_utils::create_route_with_loads(&[6, 3, -9])];
        manager.insertion_starts(&mut routes).unwrap();

        let share = |activity: i32| {
            manager
                .states()
                .get_activity_state::<f64>(ActivityIdx::new(activity), key)
                .unwrap()
                .copied()
        };
        assert_eq!(share(1), Some(0.4));
        assert_eq!(share(2), Some(0.6));
        assert_eq!(share(3), Some(0.0));
    }

    #[test]
    fn test_traversal_error_propagates() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();
        let key = manager.get_or_create_key("load_share").unwrap();
        manager.add_state_updater(Box::new(LoadShare { key }));

        // Zero capacity vehicle with a non zero load
        let mut route = VehicleRoute::empty(
            Arc::new(test_utils::create_vehicle_with_rates(1.0, 0.0)),
            Arc::new(Driver::default()),
        );
        route.push(test_utils::create_activity(1, 1, 5));

        let result = manager.insertion_starts(std::slice::from_mut(&mut route));

        assert!(matches!(result, Err(StateError::Capacity(_))));
    }

    #[test]
    fn test_listeners_run_before_traversals() {
        let mut manager = test_utils::create_state_manager();
        let events = Rc::new(RefCell::new(Vec::new()));
        manager.update_load_states();
        manager.add_state_updater(Box::new(EventLog {
            events: Rc::clone(&events),
        }));

        let mut routes = vec![test_utils::create_route_with_loads(&[10])];
        manager.iteration_starts(0, &routes).unwrap();
        manager.insertion_starts(&mut routes).unwrap();

        let route = &mut routes[0];
        route.push(test_utils::create_activity(2, 2, -10));
        manager.job_inserted(route, JobIdx::new(1)).unwrap();
        manager.insertion_ends(&routes).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                String::from("iteration 0"),
                String::from("inserted 1 into 2 (false)"),
                String::from("insertion ends on 1"),
            ]
        );
        assert_eq!(load_at(&manager, 2), Some(0));
    }

    #[test]
    fn test_full_route_update() {
        let mut manager = test_utils::create_state_manager();
        manager.update_load_states();
        manager.update_time_window_states(RouteVehicle);
        manager.update_cost_states();
        manager.update_skill_states();

        let mut route = test_utils::create_route_with_skills(&[&["crane"], &["forklift"]]);
        manager
            .insertion_starts(std::slice::from_mut(&mut route))
            .unwrap();

        let states = manager.states();
        assert_eq!(
            states
                .get_route_state::<Skills>(route.id(), SKILLS)
                .unwrap()
                .map(|skills| skills.len()),
            Some(2)
        );
        // Three legs of 10 * 1.0 + 10 * 0.5
        assert_eq!(states.get_route_state::<f64>(route.id(), COSTS), Ok(Some(&45.0)));
        assert_eq!(route.end().arrival_time(), ts(30));
        assert_eq!(
            states.get_activity_state::<Timestamp>(ActivityIdx::new(2), LATEST_OPERATION_START_TIME),
            Ok(Some(&ts(990)))
        );
    }
}
