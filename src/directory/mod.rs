pub mod business;
pub mod store;
