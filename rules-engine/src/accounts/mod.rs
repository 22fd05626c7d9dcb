pub mod account_models;

pub use account_models::{Company, Subscription, User};
