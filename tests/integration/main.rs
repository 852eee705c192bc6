//! Integration tests for Sumi-Scout

mod config_tests;
mod crawl_tests;
