pub mod audit;
pub mod entities;
pub mod health;
pub mod queue;
pub mod services;
pub mod worker;

#[cfg(test)]
mod tests;
