pub mod routes;
pub mod task;
