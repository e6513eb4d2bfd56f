pub mod decoder;
pub mod device;
pub mod effect;
pub mod engine;
pub mod source;
pub mod transport;
pub mod types;
