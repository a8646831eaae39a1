//! AWS Bedrock Runtime backend
//!
//! Reaches Bedrock-hosted models with AWS IAM credentials, through either
//! the Converse API or the per-vendor InvokeModel API.

mod adapter;
mod types;

pub use adapter::BedrockModelInvoker;
pub use types::classify_error_code;
