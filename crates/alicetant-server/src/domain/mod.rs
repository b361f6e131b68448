mod appointment;
mod auth_token;
mod availability;
mod business;
mod user;

pub use appointment::*;
pub use auth_token::*;
pub use availability::*;
pub use business::*;
pub use user::*;
