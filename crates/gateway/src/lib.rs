pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod community;
pub mod runtime;
pub mod state;
pub mod transport;
