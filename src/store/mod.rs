pub mod account;
#[cfg(test)]
pub mod memory;
pub mod refresh;
pub mod reset;
