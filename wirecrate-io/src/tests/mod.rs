//! Test modules for wirecrate-io
//!
//! File-level tests of the line-set codec and the directory merge, run
//! against temporary directories.

pub mod merge_tests;
