//! Structured parsing of device CLI output.
//!
//! A [`Template`] turns the text a device prints for one command into rows of named
//! fields, the way TextFSM templates do for network automation tooling. Each template
//! knows which lines are boilerplate (headers, separators, totals); any other line that
//! does not match the record pattern comes back as [`ParsedRow::Unparsable`] so the
//! caller decides whether to drop it.

pub mod ios;
pub mod template;

pub use template::{Fields, ParsedRow, Template};
