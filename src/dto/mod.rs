pub mod account_dto;
pub mod user_dto;
