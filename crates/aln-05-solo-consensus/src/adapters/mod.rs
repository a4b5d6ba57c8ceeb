pub mod chat_policy;

pub use chat_policy::{ChatMetadataPolicy, JURISDICTIONS};
