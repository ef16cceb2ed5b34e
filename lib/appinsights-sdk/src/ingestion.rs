pub mod buffer;
pub mod builder;
pub mod client;
