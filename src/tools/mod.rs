//! External tool integration

pub mod runner;
pub mod toolkit;

pub use runner::{ToolInvocation, ToolRunner};
pub use toolkit::Toolkit;
