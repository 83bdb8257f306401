//! Processing nodes: LLM calls and value transforms

mod llm_processor;
mod transform;

pub use llm_processor::llm_processor;
pub use transform::{transform, TransformOperation};
