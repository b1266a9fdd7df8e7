use std::{
    any::{Any, type_name},
    fmt,
};

use fxhash::FxHashMap;
use tracing::trace;

use crate::{
    error::StateError,
    problem::vehicle::VehicleTypeIdx,
    solution::{activity::ActivityIdx, route_id::RouteIdx},
    state::{
        state_key::{RESERVED_KEY_COUNT, StateKey, StateKeyRegistry},
        state_params::StateParams,
    },
};

struct StateCell {
    value: Box<dyn Any>,
    type_name: &'static str,
}

impl StateCell {
    fn new<T: 'static>(value: T) -> Self {
        StateCell {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }
}

type StateRow = Vec<Option<StateCell>>;

/// Dimensions of a flat table, addressed as `(outer, middle, inner)`.
#[derive(Debug, Clone, Copy)]
struct TableShape {
    outer: usize,
    middle: usize,
    inner: usize,
}

impl TableShape {
    fn len(&self) -> usize {
        self.outer * self.middle * self.inner
    }

    #[inline(always)]
    fn offset(&self, outer: usize, middle: usize, inner: usize) -> usize {
        (outer * self.middle + middle) * self.inner + inner
    }
}

fn empty_row(len: usize) -> StateRow {
    std::iter::repeat_with(|| None).take(len).collect()
}

/// Moves every present cell from the `from` layout to the `to` layout.
fn resize_table(table: &mut StateRow, from: TableShape, to: TableShape) {
    let mut resized = empty_row(to.len());

    for (offset, cell) in std::mem::take(table).into_iter().enumerate() {
        if let Some(cell) = cell {
            let inner = offset % from.inner;
            let middle = (offset / from.inner) % from.middle;
            let outer = offset / (from.inner * from.middle);
            resized[to.offset(outer, middle, inner)] = Some(cell);
        }
    }

    *table = resized;
}

fn grown_capacity(capacity: usize, index: usize) -> usize {
    (index + 1).max(capacity * 2)
}

/// Dense storage of every computed state.
///
/// Activity states live in flat tables indexed by activity index, vehicle
/// type and key. Route states are kept per route identity. Reads of cells that
/// were never written return `Ok(None)`.
pub struct StateStore {
    registry: StateKeyRegistry,

    key_capacity: usize,
    activity_capacity: usize,
    vehicle_type_capacity: usize,

    activity_states: StateRow,
    vehicle_activity_states: StateRow,
    route_states: FxHashMap<RouteIdx, StateRow>,
    vehicle_route_states: FxHashMap<RouteIdx, StateRow>,

    // Not reset by `clear`
    problem_states: StateRow,
}

impl StateStore {
    pub fn new(params: &StateParams) -> Self {
        let registry = StateKeyRegistry::default();
        let key_capacity = params
            .initial_key_capacity
            .max(registry.key_count())
            .max(RESERVED_KEY_COUNT);
        let activity_capacity = params.activity_count.max(1);
        let vehicle_type_capacity = params.vehicle_type_count.max(1);

        let mut store = StateStore {
            registry,
            key_capacity,
            activity_capacity,
            vehicle_type_capacity,
            activity_states: Vec::new(),
            vehicle_activity_states: Vec::new(),
            route_states: FxHashMap::default(),
            vehicle_route_states: FxHashMap::default(),
            problem_states: Vec::new(),
        };

        store.activity_states = empty_row(store.activity_shape().len());
        store.vehicle_activity_states = empty_row(store.vehicle_activity_shape().len());
        store.problem_states = empty_row(store.route_shape().len());

        store
    }

    pub fn registry(&self) -> &StateKeyRegistry {
        &self.registry
    }

    pub fn key_capacity(&self) -> usize {
        self.key_capacity
    }

    pub fn activity_capacity(&self) -> usize {
        self.activity_capacity
    }

    pub fn vehicle_type_capacity(&self) -> usize {
        self.vehicle_type_capacity
    }

    /// Registers `name` and makes room for its key in every table.
    pub fn get_or_create_key(&mut self, name: &str) -> Result<StateKey, StateError> {
        let key = self.registry.get_or_create_key(name)?;
        if key.index() >= self.key_capacity {
            self.grow_keys(grown_capacity(self.key_capacity, key.index()));
        }
        Ok(key)
    }

    /// Resets every solution state. Problem states are kept.
    pub fn clear(&mut self) {
        self.activity_states.iter_mut().for_each(|cell| *cell = None);
        self.vehicle_activity_states
            .iter_mut()
            .for_each(|cell| *cell = None);
        self.route_states.clear();
        self.vehicle_route_states.clear();
    }

    // Activity states

    pub fn get_activity_state<T: 'static>(
        &self,
        activity: ActivityIdx,
        key: StateKey,
    ) -> Result<Option<&T>, StateError> {
        let name = self.key_name(key)?;
        let Some(row) = self.activity_row(activity)? else {
            return Ok(None);
        };
        if row >= self.activity_capacity {
            return Ok(None);
        }

        let cell = &self.activity_states[self.activity_shape().offset(row, 0, key.index())];
        downcast(cell, name)
    }

    pub fn has_activity_state(
        &self,
        activity: ActivityIdx,
        key: StateKey,
    ) -> Result<bool, StateError> {
        self.key_name(key)?;
        let Some(row) = self.activity_row(activity)? else {
            return Ok(false);
        };

        Ok(row < self.activity_capacity
            && self.activity_states[self.activity_shape().offset(row, 0, key.index())].is_some())
    }

    pub fn put_activity_state<T: 'static>(
        &mut self,
        activity: ActivityIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.check_writable(key)?;
        self.put_internal_activity_state(activity, key, value)
    }

    pub(crate) fn put_internal_activity_state<T: 'static>(
        &mut self,
        activity: ActivityIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        let row = self.writable_activity_row(activity, key)?;
        let offset = self.activity_shape().offset(row, 0, key.index());
        self.activity_states[offset] = Some(StateCell::new(value));
        Ok(())
    }

    // Vehicle dependent activity states

    pub fn get_vehicle_activity_state<T: 'static>(
        &self,
        activity: ActivityIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
    ) -> Result<Option<&T>, StateError> {
        let name = self.key_name(key)?;
        let Some(row) = self.activity_row(activity)? else {
            return Ok(None);
        };
        if row >= self.activity_capacity || vehicle_type.get() >= self.vehicle_type_capacity {
            return Ok(None);
        }

        let offset = self
            .vehicle_activity_shape()
            .offset(row, vehicle_type.get(), key.index());
        downcast(&self.vehicle_activity_states[offset], name)
    }

    pub fn has_vehicle_activity_state(
        &self,
        activity: ActivityIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
    ) -> Result<bool, StateError> {
        self.key_name(key)?;
        let Some(row) = self.activity_row(activity)? else {
            return Ok(false);
        };
        if row >= self.activity_capacity || vehicle_type.get() >= self.vehicle_type_capacity {
            return Ok(false);
        }

        let offset = self
            .vehicle_activity_shape()
            .offset(row, vehicle_type.get(), key.index());
        Ok(self.vehicle_activity_states[offset].is_some())
    }

    pub fn put_vehicle_activity_state<T: 'static>(
        &mut self,
        activity: ActivityIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.check_writable(key)?;
        self.put_internal_vehicle_activity_state(activity, vehicle_type, key, value)
    }

    pub(crate) fn put_internal_vehicle_activity_state<T: 'static>(
        &mut self,
        activity: ActivityIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        let row = self.writable_activity_row(activity, key)?;
        self.ensure_vehicle_type(vehicle_type);

        let offset = self
            .vehicle_activity_shape()
            .offset(row, vehicle_type.get(), key.index());
        self.vehicle_activity_states[offset] = Some(StateCell::new(value));
        Ok(())
    }

    // Route states

    pub fn get_route_state<T: 'static>(
        &self,
        route: RouteIdx,
        key: StateKey,
    ) -> Result<Option<&T>, StateError> {
        let name = self.key_name(key)?;
        match self.route_states.get(&route) {
            Some(states) => downcast(&states[key.index()], name),
            None => Ok(None),
        }
    }

    pub fn has_route_state(&self, route: RouteIdx, key: StateKey) -> Result<bool, StateError> {
        self.key_name(key)?;
        Ok(self
            .route_states
            .get(&route)
            .is_some_and(|states| states[key.index()].is_some()))
    }

    pub fn put_route_state<T: 'static>(
        &mut self,
        route: RouteIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.check_writable(key)?;
        self.put_internal_route_state(route, key, value)
    }

    pub(crate) fn put_internal_route_state<T: 'static>(
        &mut self,
        route: RouteIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.key_name(key)?;
        let len = self.route_shape().len();
        let states = self
            .route_states
            .entry(route)
            .or_insert_with(|| empty_row(len));
        states[key.index()] = Some(StateCell::new(value));
        Ok(())
    }

    // Vehicle dependent route states

    pub fn get_vehicle_route_state<T: 'static>(
        &self,
        route: RouteIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
    ) -> Result<Option<&T>, StateError> {
        let name = self.key_name(key)?;
        if vehicle_type.get() >= self.vehicle_type_capacity {
            return Ok(None);
        }

        let offset = self
            .vehicle_route_shape()
            .offset(0, vehicle_type.get(), key.index());
        match self.vehicle_route_states.get(&route) {
            Some(states) => downcast(&states[offset], name),
            None => Ok(None),
        }
    }

    pub fn has_vehicle_route_state(
        &self,
        route: RouteIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
    ) -> Result<bool, StateError> {
        self.key_name(key)?;
        if vehicle_type.get() >= self.vehicle_type_capacity {
            return Ok(false);
        }

        let offset = self
            .vehicle_route_shape()
            .offset(0, vehicle_type.get(), key.index());
        Ok(self
            .vehicle_route_states
            .get(&route)
            .is_some_and(|states| states[offset].is_some()))
    }

    pub fn put_vehicle_route_state<T: 'static>(
        &mut self,
        route: RouteIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.check_writable(key)?;
        self.put_internal_vehicle_route_state(route, vehicle_type, key, value)
    }

    pub(crate) fn put_internal_vehicle_route_state<T: 'static>(
        &mut self,
        route: RouteIdx,
        vehicle_type: VehicleTypeIdx,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.key_name(key)?;
        self.ensure_vehicle_type(vehicle_type);

        let shape = self.vehicle_route_shape();
        let states = self
            .vehicle_route_states
            .entry(route)
            .or_insert_with(|| empty_row(shape.len()));
        states[shape.offset(0, vehicle_type.get(), key.index())] = Some(StateCell::new(value));
        Ok(())
    }

    // Problem states

    pub fn get_problem_state<T: 'static>(&self, key: StateKey) -> Result<Option<&T>, StateError> {
        let name = self.key_name(key)?;
        downcast(&self.problem_states[key.index()], name)
    }

    pub fn has_problem_state(&self, key: StateKey) -> Result<bool, StateError> {
        self.key_name(key)?;
        Ok(self.problem_states[key.index()].is_some())
    }

    pub fn put_problem_state<T: 'static>(
        &mut self,
        key: StateKey,
        value: T,
    ) -> Result<(), StateError> {
        self.check_writable(key)?;
        self.problem_states[key.index()] = Some(StateCell::new(value));
        Ok(())
    }

    fn activity_shape(&self) -> TableShape {
        TableShape {
            outer: self.activity_capacity,
            middle: 1,
            inner: self.key_capacity,
        }
    }

    fn vehicle_activity_shape(&self) -> TableShape {
        TableShape {
            outer: self.activity_capacity,
            middle: self.vehicle_type_capacity,
            inner: self.key_capacity,
        }
    }

    fn route_shape(&self) -> TableShape {
        TableShape {
            outer: 1,
            middle: 1,
            inner: self.key_capacity,
        }
    }

    fn vehicle_route_shape(&self) -> TableShape {
        TableShape {
            outer: 1,
            middle: self.vehicle_type_capacity,
            inner: self.key_capacity,
        }
    }

    fn key_name(&self, key: StateKey) -> Result<&str, StateError> {
        self.registry
            .key_name(key)
            .ok_or(StateError::UnknownKey(key.index()))
    }

    fn check_writable(&self, key: StateKey) -> Result<(), StateError> {
        let name = self.key_name(key)?;
        if key.is_reserved() {
            return Err(StateError::ReservedKeyWrite(name.to_owned()));
        }
        Ok(())
    }

    /// Row of a job activity, `None` for anchors.
    fn activity_row(&self, activity: ActivityIdx) -> Result<Option<usize>, StateError> {
        if activity.is_unset() {
            return Err(StateError::UnindexedActivity);
        }
        if activity.is_anchor() {
            return Ok(None);
        }
        Ok(Some(activity.get() as usize))
    }

    fn writable_activity_row(
        &mut self,
        activity: ActivityIdx,
        key: StateKey,
    ) -> Result<usize, StateError> {
        let name = self.key_name(key)?;
        let Some(row) = self.activity_row(activity)? else {
            return Err(StateError::AnchorActivity {
                key: name.to_owned(),
                index: activity,
            });
        };

        if row >= self.activity_capacity {
            self.grow_activities(grown_capacity(self.activity_capacity, row));
        }
        Ok(row)
    }

    fn ensure_vehicle_type(&mut self, vehicle_type: VehicleTypeIdx) {
        if vehicle_type.get() >= self.vehicle_type_capacity {
            self.grow_vehicle_types(grown_capacity(
                self.vehicle_type_capacity,
                vehicle_type.get(),
            ));
        }
    }

    fn grow_keys(&mut self, key_capacity: usize) {
        trace!(from = self.key_capacity, to = key_capacity, "Growing state key capacity");
        let before = self.snapshot_shapes();
        self.key_capacity = key_capacity;
        self.resize_tables(before);
    }

    fn grow_activities(&mut self, activity_capacity: usize) {
        trace!(
            from = self.activity_capacity,
            to = activity_capacity,
            "Growing activity state capacity"
        );
        let before = self.snapshot_shapes();
        self.activity_capacity = activity_capacity;
        self.resize_tables(before);
    }

    fn grow_vehicle_types(&mut self, vehicle_type_capacity: usize) {
        trace!(
            from = self.vehicle_type_capacity,
            to = vehicle_type_capacity,
            "Growing vehicle type state capacity"
        );
        let before = self.snapshot_shapes();
        self.vehicle_type_capacity = vehicle_type_capacity;
        self.resize_tables(before);
    }

    fn snapshot_shapes(&self) -> [TableShape; 4] {
        [
            self.activity_shape(),
            self.vehicle_activity_shape(),
            self.route_shape(),
            self.vehicle_route_shape(),
        ]
    }

    fn resize_tables(&mut self, before: [TableShape; 4]) {
        let [activity, vehicle_activity, route, vehicle_route] = before;
        let [activity_shape, vehicle_activity_shape, route_shape, vehicle_route_shape] =
            self.snapshot_shapes();

        resize_table(&mut self.activity_states, activity, activity_shape);
        resize_table(
            &mut self.vehicle_activity_states,
            vehicle_activity,
            vehicle_activity_shape,
        );
        resize_table(&mut self.problem_states, route, route_shape);

        for states in self.route_states.values_mut() {
            resize_table(states, route, route_shape);
        }

        for states in self.vehicle_route_states.values_mut() {
            resize_table(states, vehicle_route, vehicle_route_shape);
        }
    }
}

fn downcast<'a, T: 'static>(
    cell: &'a Option<StateCell>,
    key_name: &str,
) -> Result<Option<&'a T>, StateError> {
    match cell {
        None => Ok(None),
        Some(cell) => match cell.value.downcast_ref::<T>() {
            Some(value) => Ok(Some(value)),
            None => Err(StateError::TypeMismatch {
                key: key_name.to_owned(),
                expected: type_name::<T>(),
                actual: cell.type_name,
            }),
        },
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("key_capacity", &self.key_capacity)
            .field("activity_capacity", &self.activity_capacity)
            .field("vehicle_type_capacity", &self.vehicle_type_capacity)
            .field("routes", &self.route_states.len())
            .finish()
    }
}
