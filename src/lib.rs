pub mod actions;
pub mod building;
pub mod input;
pub mod scenery;
pub mod settings;
pub mod setup;
pub mod state;
pub mod ui;
