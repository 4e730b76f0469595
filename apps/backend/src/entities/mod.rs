pub mod cryptocurrencies;
pub mod users;

pub use cryptocurrencies::Entity as Cryptocurrencies;
pub use cryptocurrencies::Model as Cryptocurrency;
pub use users::Entity as Users;
pub use users::Model as User;
