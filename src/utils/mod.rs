pub mod paths;
pub mod state;
