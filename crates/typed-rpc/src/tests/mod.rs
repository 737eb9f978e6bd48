//! Scenario tests spanning several modules





#[cfg(test)]
pub mod router_tests;
