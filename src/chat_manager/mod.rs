pub mod intent;
pub mod parser;
pub mod prompts;
pub mod provider_adapter;
pub mod request;
pub mod resolver;
pub mod service;
pub mod types;

pub use resolver::{resolve_providers, Resolution, MAX_TOP_UP_ATTEMPTS};
pub use service::{HttpModelInvoker, ModelInvoker};
pub use types::{ProviderRecord, RequestContext};
