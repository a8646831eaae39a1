//! Model backends implementing the
//! [`ModelInvoker`](converse_application::ModelInvoker) port.

#[cfg(feature = "bedrock")]
pub mod bedrock;
