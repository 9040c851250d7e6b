pub mod light_state;
pub mod registry;
