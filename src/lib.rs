#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod coordinator;
pub mod error;
pub mod prelude;
pub mod quantity;
pub mod reading;
pub mod settings;
pub mod tariff;
