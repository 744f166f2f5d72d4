pub mod apps;
pub mod config;
pub mod rpc;
pub mod store;
pub mod task;

pub use rpc::*;
pub use store::KeyValue;
pub use task::*;
