pub mod app_config;
pub mod http_gateway;
pub mod memory_store;
pub mod redis_repo;

pub use http_gateway::SupplierHttpClient;
pub use memory_store::MemoryDraftStore;
pub use redis_repo::RedisDraftStore;
