pub mod factory;
pub mod rpc;

// Re-export commonly used types
pub use factory::FactoryGameFetcher;
pub use rpc::RpcBlockFetcher;
