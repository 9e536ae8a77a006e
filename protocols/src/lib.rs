//! Formats spoken with the outside world: DNS PTR packets and the text output of
//! network-device CLIs.

pub mod cli;
pub mod dns;
