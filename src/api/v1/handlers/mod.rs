pub mod health;
pub mod secured;
