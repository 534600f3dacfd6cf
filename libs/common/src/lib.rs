pub mod log;
pub mod network;
