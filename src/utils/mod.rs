//! Small shared helpers: map constructors and run id generation.

pub mod collections;
pub mod id_generator;
