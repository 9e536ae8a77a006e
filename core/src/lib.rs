//! # edgemap core
//!
//! Device sessions, the fetch → correlate → resolve **pipeline**, and the configuration
//! workflows (backup, interface deploy, write memory) built on the same sessions.

pub mod backup;
pub mod correlate;
pub mod deploy;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod session;
