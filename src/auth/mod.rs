//! Registration, log-in and the cookie based sessions that guard the API.

mod cookie;
mod log_in;
mod log_out;
mod me;
mod middleware;
mod password;
mod register;
mod token;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use me::get_me;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register::register_user;
pub(crate) use token::Token;

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
