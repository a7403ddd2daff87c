//! Core library: the vector-database gateway and the endpoint tester.

pub mod benchmark;
pub mod config;
pub mod gateway;
pub mod probe;
pub mod report;
pub mod suites;
pub mod tester;
pub mod vectorstore;
