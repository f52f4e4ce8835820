pub mod accessor;
pub mod hierarchy;
pub mod u2;
