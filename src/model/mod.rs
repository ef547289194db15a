pub mod issue;
pub mod user;
