//! Repository functions returning domain models and `DomainError`.

pub mod crypto;
pub mod users;
