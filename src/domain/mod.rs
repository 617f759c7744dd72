pub mod batch;
pub mod lead;
pub mod property;
