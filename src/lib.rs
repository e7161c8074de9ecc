//! Agricultural advisory service.
//!
//! Turns farming conditions into a crop recommendation prompt, or a plant
//! photo into a disease analysis prompt, asks a generative model, and relays
//! its JSON answer. Failures become fixed, schema-conformant payloads.

pub mod advisor;
pub mod config;
pub mod error;
pub mod model;
pub mod models;
pub mod normalizer;
pub mod prompts;
pub mod server;
pub mod upload;


pub use advisor::{Advisor, Reply};
pub use config::Config;
pub use error::AdvisoryError;
pub use model::{GeminiClient, GenerativeModel, InlineImage, ModelError};
pub use server::{Function, FunctionName, Standalone, TransportAdapter};
