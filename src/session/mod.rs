mod provider;
mod token;

pub use provider::{BackendTokenProvider, SessionTokenProvider};
pub use token::SessionToken;
