//! Website serving logic: bucket access, path resolution, representation
//! building and conditional responses.

pub mod conditional;
#[cfg(test)]
pub mod memory_store;
pub mod object_store;
pub mod resolver;
pub mod response_builder;
pub mod s3_store;
