mod client;

pub use client::{Authenticator, Credentials, LoginClient};
