pub mod alerts;
pub mod charts;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod drivers;
pub mod form;
pub mod gauge;
pub mod logging;
pub mod model;
pub mod recommendations;
pub mod simulation;
pub mod term;
pub mod view;
