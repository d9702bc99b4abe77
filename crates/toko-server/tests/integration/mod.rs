mod common;
mod public_api_tests;
