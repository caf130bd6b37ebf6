//! Repositories for user records

pub mod user;

pub use user::UserRepository;
