pub mod client;
pub mod worker;

pub use client::CoordinatorClient;
pub use worker::{execute_map, execute_reduce, Worker, WorkerExit};
