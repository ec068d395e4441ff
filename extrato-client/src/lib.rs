//! extrato-client: OAuth2 token lifecycle and the paginated Open Banking
//! client (accounts, statements, balances) for one provider.

pub mod accounts;
pub mod auth;
pub mod balances;
pub mod client;
pub mod error;
pub mod statements;

pub use auth::{Credential, Token, TokenManager, SCOPE_STATEMENTS, SCOPE_STATEMENTS_ALT};
pub use client::{ApiClient, Endpoints};
pub use error::{ApiError, ApiResult};
pub use statements::{FetchOutcome, PageCursor, DEFAULT_PAGE_SIZE, MAX_STATEMENT_RECORDS};
