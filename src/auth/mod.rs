//! OAuth2 credential lifecycle: storage, token grants, code delivery and
//! the authenticator tying them together.

pub mod authenticator;
pub mod callback;
pub mod oauth;
pub mod receiver;
pub mod store;

pub use authenticator::{AuthSettings, Authenticator};
pub use callback::LoopbackReceiver;
pub use oauth::{HttpTokenEndpoint, OAuthClient, OAuthError, TokenEndpoint, TokenGrant};
pub use receiver::{CodeReceiver, ConsoleReceiver};
pub use store::{CredentialStore, FileCredentialStore};
