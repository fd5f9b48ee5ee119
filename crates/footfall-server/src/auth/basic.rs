use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
    Engine,
};

/// Outcome of checking an `Authorization` header against the operator secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCheck {
    Granted,
    /// No operator secret is configured.
    NotConfigured,
    /// Header absent, not `Basic`, or without credentials.
    MissingCredentials,
    WrongPassword,
}

/// Check HTTP Basic credentials. The username is ignored; the password must
/// equal `secret` byte for byte.
pub fn check_basic_auth(secret: Option<&str>, authorization: Option<&str>) -> OperatorCheck {
    let Some(secret) = secret else {
        return OperatorCheck::NotConfigured;
    };

    let header = authorization.unwrap_or("");
    let mut parts = header.split(' ');
    let scheme = parts.next().unwrap_or("");
    let encoded = parts.next().unwrap_or("");
    if scheme != "Basic" || encoded.is_empty() {
        return OperatorCheck::MissingCredentials;
    }

    match basic_password(encoded) {
        Some(password) if password.as_bytes() == secret.as_bytes() => OperatorCheck::Granted,
        _ => OperatorCheck::WrongPassword,
    }
}

/// Decode `user:password` and return the part after the first colon, or an
/// empty password when there is no colon.
fn basic_password(encoded: &str) -> Option<String> {
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .ok()?;
    let decoded = String::from_utf8_lossy(&bytes);
    Some(
        decoded
            .split_once(':')
            .map(|(_, password)| password.to_string())
            .unwrap_or_default(),
    )
}
