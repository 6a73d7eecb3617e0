pub mod account;
pub mod health;
pub mod password_reset;
pub mod users;
