pub mod generator;
pub mod mistral;
pub mod rules;
pub mod thread_memory;
