pub mod activity_start_policy;
pub mod activity_time_tracker;
pub mod state_updater;
pub mod update_activity_times;
pub mod update_latest_start;
pub mod update_loads;
pub mod update_max_load;
pub mod update_skills;
pub mod update_variable_costs;
pub mod visitor;
