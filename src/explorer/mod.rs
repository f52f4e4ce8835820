pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod explorer;
pub mod recovery;
pub mod report;
