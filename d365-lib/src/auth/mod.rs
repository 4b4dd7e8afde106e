//! Authentication

mod password;
mod token;

pub use password::DEFAULT_TOKEN_URL;
pub use password::PasswordFlow;
pub use token::AccessToken;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;
