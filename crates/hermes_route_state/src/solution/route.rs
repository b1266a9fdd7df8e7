use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    problem::{
        job::JobIdx,
        vehicle::{Driver, Vehicle},
    },
    solution::{activity::Activity, route_id::RouteIdx},
};

/// Read-only view of a route handed to visitors while its activities are
/// borrowed mutably.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub id: RouteIdx,
    pub vehicle: &'a Vehicle,
    pub driver: &'a Driver,
    pub start: &'a Activity,
    pub end: &'a Activity,
}

/// Ordered activities served by one vehicle, bounded by the start and end anchors.
///
/// The route id is the identity used to address route-level states. Clones
/// get a new id.
#[derive(Debug)]
pub struct VehicleRoute {
    id: RouteIdx,
    vehicle: Arc<Vehicle>,
    driver: Arc<Driver>,
    departure_time: Timestamp,
    start: Activity,
    end: Activity,
    activities: Vec<Activity>,
}

impl Clone for VehicleRoute {
    fn clone(&self) -> Self {
        VehicleRoute {
            id: RouteIdx::next(),
            vehicle: Arc::clone(&self.vehicle),
            driver: Arc::clone(&self.driver),
            departure_time: self.departure_time,
            start: self.start.clone(),
            end: self.end.clone(),
            activities: self.activities.clone(),
        }
    }
}

impl VehicleRoute {
    pub fn empty(vehicle: Arc<Vehicle>, driver: Arc<Driver>) -> Self {
        let departure_time = vehicle.earliest_start();
        VehicleRoute {
            id: RouteIdx::next(),
            start: Activity::start(&vehicle, departure_time),
            end: Activity::end(&vehicle),
            vehicle,
            driver,
            departure_time,
            activities: Vec::new(),
        }
    }

    pub fn id(&self) -> RouteIdx {
        self.id
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn shared_vehicle(&self) -> &Arc<Vehicle> {
        &self.vehicle
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn departure_time(&self) -> Timestamp {
        self.departure_time
    }

    pub fn set_departure_time(&mut self, departure_time: Timestamp) {
        self.departure_time = departure_time;
        self.start.set_arrival_time(departure_time);
        self.start.set_end_time(departure_time);
    }

    pub fn start(&self) -> &Activity {
        &self.start
    }

    pub fn end(&self) -> &Activity {
        &self.end
    }

    pub(crate) fn end_mut(&mut self) -> &mut Activity {
        &mut self.end
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn activities_mut(&mut self) -> &mut [Activity] {
        &mut self.activities
    }

    pub(crate) fn split_activities_mut(&mut self) -> (RouteContext<'_>, &mut [Activity]) {
        let VehicleRoute {
            id,
            vehicle,
            driver,
            start,
            end,
            activities,
            ..
        } = self;

        (
            RouteContext {
                id: *id,
                vehicle,
                driver,
                start,
                end,
            },
            activities,
        )
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn contains_job(&self, job_id: JobIdx) -> bool {
        self.activities
            .iter()
            .any(|activity| activity.job_id() == Some(job_id))
    }

    pub fn insert(&mut self, position: usize, activity: Activity) {
        self.activities.insert(position, activity);
    }

    pub fn push(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    /// Removes every activity of the job, returns how many were removed.
    pub fn remove_job(&mut self, job_id: JobIdx) -> usize {
        let before = self.activities.len();
        self.activities
            .retain(|activity| activity.job_id() != Some(job_id));
        before - self.activities.len()
    }
}
