mod build_tests;
mod config_tests;
mod support;
