pub mod auth;

pub use auth::{AuthState, AuthUser, OptionalAuthUser};
