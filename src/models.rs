pub mod category;
pub mod store;
pub mod task;
