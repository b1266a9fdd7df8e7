pub mod activity_costs;
pub mod capacity;
pub mod job;
pub mod location;
pub mod skill;
pub mod time_window;
pub mod transport_costs;
pub mod travel_cost_matrix;
pub mod vehicle;
