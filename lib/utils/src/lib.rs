pub mod checks;
pub mod constants;
pub mod errors;
pub mod routes;
