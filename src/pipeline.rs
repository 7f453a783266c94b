pub mod config;
pub mod context;
pub mod sink;
pub mod stream;
pub mod supervisor;
