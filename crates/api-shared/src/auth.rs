/// Header carrying the shared access password.
pub const ACCESS_PASSWORD_HEADER: &str = "x-access-password";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid password")]
    InvalidPassword,
}

/// Validates a provided password against the expected one.
///
/// The expected password is resolved at startup and passed in; this never reads the
/// environment. A missing password is treated like a wrong one.
pub fn validate_access_password(provided: Option<&str>, expected: &str) -> Result<(), AuthError> {
    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(AuthError::InvalidPassword),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
