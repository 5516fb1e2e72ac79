pub mod application;
pub mod codes;
pub mod columns;
pub mod config;
pub mod decode;
pub mod domain;
pub mod error;
pub mod filter;
pub mod ports;
pub mod similarity;
pub mod table;
pub mod utils;
