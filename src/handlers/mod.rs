pub mod health;
pub mod ratings;
