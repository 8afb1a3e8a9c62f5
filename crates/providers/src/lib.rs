//! Model completion providers for Steward.
//!
//! Providers implement `steward_core::Provider`. They are transport only:
//! failures surface as `ProviderError` and nothing is retried here.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
