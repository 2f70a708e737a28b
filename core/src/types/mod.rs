pub mod config;
pub mod response;
pub mod topology;
