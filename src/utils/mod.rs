pub mod auth;
pub mod data_uri;
pub mod in_flight;
pub mod validation;
