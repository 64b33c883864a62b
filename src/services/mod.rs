pub mod context_service;

pub use context_service::ContextService;
