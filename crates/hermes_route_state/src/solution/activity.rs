use std::fmt;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    error::StateError,
    problem::{
        capacity::Capacity,
        job::JobIdx,
        location::LocationIdx,
        skill::{Skill, Skills},
        time_window::{TimeWindow, TimeWindows},
        vehicle::Vehicle,
    },
};

/// Stable index of an activity in the activity population.
///
/// Job activities get positive indices. `0` is never a valid index and
/// negative values are reserved for the route anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityIdx(i32);

impl ActivityIdx {
    pub const UNSET: ActivityIdx = ActivityIdx(0);
    pub const START: ActivityIdx = ActivityIdx(-1);
    pub const END: ActivityIdx = ActivityIdx(-2);

    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    pub const fn get(&self) -> i32 {
        self.0
    }

    pub const fn is_anchor(&self) -> bool {
        self.0 < 0
    }

    pub const fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ActivityIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Start,
    End,
    Service,
    /// Service that loads goods on the vehicle and keeps them until the route end.
    Pickup,
    /// Service that drops goods loaded at the route start.
    Delivery,
    ShipmentPickup,
    ShipmentDelivery,
    Break,
}

impl ActivityKind {
    pub fn is_anchor(&self) -> bool {
        matches!(self, ActivityKind::Start | ActivityKind::End)
    }
}

/// One visit of a route, including the scheduled times computed for it.
#[derive(Debug, Clone)]
pub struct Activity {
    index: ActivityIdx,
    kind: ActivityKind,
    job_id: Option<JobIdx>,
    location_id: LocationIdx,
    operation_duration: SignedDuration,
    load_change: Capacity,
    time_windows: TimeWindows,
    selected_time_window: usize,
    required_skills: Skills,

    arrival_time: Timestamp,
    end_time: Timestamp,
}

impl Activity {
    pub(crate) fn start(vehicle: &Vehicle, departure_time: Timestamp) -> Self {
        Activity {
            index: ActivityIdx::START,
            kind: ActivityKind::Start,
            job_id: None,
            location_id: vehicle.start_location_id(),
            operation_duration: SignedDuration::ZERO,
            load_change: Capacity::EMPTY,
            time_windows: TimeWindows::single(TimeWindow::new(
                Some(vehicle.earliest_start()),
                None,
            )),
            selected_time_window: 0,
            required_skills: Skills::default(),
            arrival_time: departure_time,
            end_time: departure_time,
        }
    }

    pub(crate) fn end(vehicle: &Vehicle) -> Self {
        Activity {
            index: ActivityIdx::END,
            kind: ActivityKind::End,
            job_id: None,
            location_id: vehicle.end_location_id(),
            operation_duration: SignedDuration::ZERO,
            load_change: Capacity::EMPTY,
            time_windows: TimeWindows::single(TimeWindow::new(
                None,
                Some(vehicle.latest_arrival()),
            )),
            selected_time_window: 0,
            required_skills: Skills::default(),
            arrival_time: Timestamp::MAX,
            end_time: Timestamp::MAX,
        }
    }

    pub fn index(&self) -> ActivityIdx {
        self.index
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn job_id(&self) -> Option<JobIdx> {
        self.job_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn operation_duration(&self) -> SignedDuration {
        self.operation_duration
    }

    /// Signed change of the vehicle load when the activity is served.
    pub fn load_change(&self) -> &Capacity {
        &self.load_change
    }

    pub fn time_windows(&self) -> &TimeWindows {
        &self.time_windows
    }

    /// Window the activity is currently scheduled into.
    pub fn selected_time_window(&self) -> Option<&TimeWindow> {
        self.time_windows.get(self.selected_time_window)
    }

    pub fn set_selected_time_window(&mut self, index: usize) -> Result<(), StateError> {
        if index >= self.time_windows.len() {
            return Err(StateError::TimeWindowOutOfBounds {
                activity: self.index,
                index,
            });
        }

        self.selected_time_window = index;
        Ok(())
    }

    pub fn required_skills(&self) -> &Skills {
        &self.required_skills
    }

    pub fn theoretical_earliest_start(&self) -> Timestamp {
        self.time_windows.earliest()
    }

    pub fn theoretical_latest_start(&self) -> Timestamp {
        self.time_windows.latest()
    }

    pub fn arrival_time(&self) -> Timestamp {
        self.arrival_time
    }

    /// Departure time, i.e. the end of the operation.
    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub(crate) fn set_arrival_time(&mut self, arrival_time: Timestamp) {
        self.arrival_time = arrival_time;
    }

    pub(crate) fn set_end_time(&mut self, end_time: Timestamp) {
        self.end_time = end_time;
    }
}

#[derive(Default)]
pub struct ActivityBuilder {
    index: Option<i32>,
    kind: Option<ActivityKind>,
    job_id: Option<usize>,
    location_id: Option<usize>,
    operation_duration: Option<SignedDuration>,
    load_change: Option<Capacity>,
    time_windows: Option<Vec<TimeWindow>>,
    required_skills: Option<Vec<String>>,
}

impl ActivityBuilder {
    pub fn set_index(&mut self, index: i32) -> &mut ActivityBuilder {
        self.index = Some(index);
        self
    }

    pub fn set_kind(&mut self, kind: ActivityKind) -> &mut ActivityBuilder {
        self.kind = Some(kind);
        self
    }

    pub fn set_job_id(&mut self, job_id: usize) -> &mut ActivityBuilder {
        self.job_id = Some(job_id);
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut ActivityBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn set_operation_duration(&mut self, duration: SignedDuration) -> &mut ActivityBuilder {
        self.operation_duration = Some(duration);
        self
    }

    pub fn set_load_change(&mut self, load_change: Capacity) -> &mut ActivityBuilder {
        self.load_change = Some(load_change);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut ActivityBuilder {
        self.time_windows = Some(vec![time_window]);
        self
    }

    pub fn set_time_windows(&mut self, time_windows: Vec<TimeWindow>) -> &mut ActivityBuilder {
        self.time_windows = Some(time_windows);
        self
    }

    pub fn set_required_skills(&mut self, skills: Vec<String>) -> &mut ActivityBuilder {
        self.required_skills = Some(skills);
        self
    }

    pub fn build(self) -> Activity {
        let kind = self.kind.unwrap_or(ActivityKind::Service);
        assert!(
            !kind.is_anchor(),
            "route anchors are created by the route itself"
        );

        let index = ActivityIdx::new(self.index.expect("Activity index is required"));
        assert!(
            index.get() > 0,
            "job activities need a positive index, got {index}"
        );

        Activity {
            index,
            kind,
            job_id: self.job_id.map(JobIdx::new),
            location_id: self.location_id.expect("Location ID is required").into(),
            operation_duration: self.operation_duration.unwrap_or(SignedDuration::ZERO),
            load_change: self.load_change.unwrap_or(Capacity::EMPTY),
            time_windows: TimeWindows::new(self.time_windows.unwrap_or_default()),
            selected_time_window: 0,
            required_skills: self
                .required_skills
                .unwrap_or_default()
                .into_iter()
                .map(Skill::new)
                .collect(),
            arrival_time: Timestamp::MAX,
            end_time: Timestamp::MAX,
        }
    }
}
