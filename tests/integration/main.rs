//! Integration tests

mod common;
mod config_test;
mod pipeline_test;
