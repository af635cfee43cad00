pub mod cli;
pub mod commands;
pub mod eligibility;
pub mod logging;
pub mod output;
pub mod session;

// Always expose testing module (integration tests need it)
pub mod testing;
