mod account_repository_tests;
mod common;
