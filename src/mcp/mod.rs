pub mod registry;
pub mod rpc;
pub mod stdio;
pub mod types;
