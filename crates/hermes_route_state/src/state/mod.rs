pub mod state_key;
pub mod state_manager;
pub mod state_params;
pub mod state_store;
