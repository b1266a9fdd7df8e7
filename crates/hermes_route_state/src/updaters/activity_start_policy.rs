use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::solution::activity::Activity;

/// Decides when the operation of an activity starts given the arrival time.
pub trait ActivityStartPolicy {
    fn start_time(&self, arrival_time: Timestamp, activity: &Activity) -> Timestamp;
}

/// Starts right away, even before the time window opens.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsSoonAsArrived;

impl ActivityStartPolicy for AsSoonAsArrived {
    fn start_time(&self, arrival_time: Timestamp, _activity: &Activity) -> Timestamp {
        arrival_time
    }
}

/// Starts at the earliest instant allowed by the first window that has not
/// closed at arrival. Arrivals after every window keep the arrival time.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsSoonAsTimeWindowOpens;

impl ActivityStartPolicy for AsSoonAsTimeWindowOpens {
    fn start_time(&self, arrival_time: Timestamp, activity: &Activity) -> Timestamp {
        activity
            .time_windows()
            .first_open_at(arrival_time)
            .and_then(|window| window.earliest_start_from(arrival_time))
            .unwrap_or(arrival_time)
    }
}

/// Waits for the window the activity is scheduled into, falls back to
/// [`AsSoonAsTimeWindowOpens`] once that window has closed.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaitForCurrentWindow;

impl ActivityStartPolicy for WaitForCurrentWindow {
    fn start_time(&self, arrival_time: Timestamp, activity: &Activity) -> Timestamp {
        activity
            .selected_time_window()
            .and_then(|window| window.earliest_start_from(arrival_time))
            .unwrap_or_else(|| AsSoonAsTimeWindowOpens.start_time(arrival_time, activity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStartStrategy {
    AsSoonAsArrived,
    #[default]
    AsSoonAsTimeWindowOpens,
    WaitForCurrentWindow,
}

impl ActivityStartPolicy for ActivityStartStrategy {
    fn start_time(&self, arrival_time: Timestamp, activity: &Activity) -> Timestamp {
        match self {
            ActivityStartStrategy::AsSoonAsArrived => {
                AsSoonAsArrived.start_time(arrival_time, activity)
            }
            ActivityStartStrategy::AsSoonAsTimeWindowOpens => {
                AsSoonAsTimeWindowOpens.start_time(arrival_time, activity)
            }
            ActivityStartStrategy::WaitForCurrentWindow => {
                WaitForCurrentWindow.start_time(arrival_time, activity)
            }
        }
    }
}
