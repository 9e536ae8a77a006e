#![cfg(test)]

mod audit;
mod deploy;
mod support;
