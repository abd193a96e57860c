//! Authentication: JWT session tokens, the request extractors that gate
//! routes on them, password hashing, and the Google Drive token relay state.

pub mod current_user;
pub mod drive_token;
pub mod password;
pub mod session;

pub use current_user::{CurrentUser, Session};
pub use drive_token::DriveToken;
