pub mod catalog;
pub mod profiles;
pub mod resolver;
