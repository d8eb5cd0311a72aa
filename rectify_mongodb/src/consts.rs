/// Database the introspection command runs against.
pub(crate) const ADMIN_DB: &str = "admin";
/// Server error code for a failed authentication.
pub(crate) const AUTHENTICATION_FAILED: i32 = 18;
/// Server error code for an unauthorized command.
pub(crate) const UNAUTHORIZED: i32 = 13;
/// Marker found in PEM blocks that hold a private key.
pub(crate) const PRIVATE_KEY_MARKER: &str = "PRIVATE KEY-----";
