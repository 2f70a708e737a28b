pub mod paths;
pub mod profile;
