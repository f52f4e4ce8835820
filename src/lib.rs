pub mod cli;
pub mod device;
pub mod error;
pub mod explorer;
pub mod record;
pub mod screen;
pub mod state;
pub mod trace;
