pub mod login;
pub mod profile;
pub mod welcome;
