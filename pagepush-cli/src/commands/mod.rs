//! CLI command implementations

pub mod clean;
pub mod publish;

pub use clean::CleanArgs;
pub use publish::PublishArgs;
