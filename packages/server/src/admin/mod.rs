//! Operator-side account management, shared by the CLI and tests.

mod users;

pub use users::{AdminUserError, AdminUsers, MIN_PASSWORD_LENGTH, generate_public_id, normalize_email};
