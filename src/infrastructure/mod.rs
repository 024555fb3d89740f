//! Infrastructure layer - External service implementations

pub mod aws;
pub mod knowledge_base;
pub mod logging;
pub mod services;
pub mod storage;
