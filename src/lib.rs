pub mod api;
pub mod cli;
pub mod client;
pub mod core;
pub mod notify;
pub mod store;
pub mod worker;
