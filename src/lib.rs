pub mod cli;
pub mod config;
pub mod dates;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod services;
pub mod sources;
