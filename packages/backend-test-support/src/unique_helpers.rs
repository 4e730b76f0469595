//! Unique test data so tests sharing a database never collide.

use uuid::Uuid;

/// `{prefix}-{uuid}`
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// `{prefix}-{uuid}@example.test`
///
/// ```
/// use backend_test_support::unique_helpers::unique_email;
///
/// let a = unique_email("test");
/// let b = unique_email("test");
/// assert_ne!(a, b);
/// assert!(a.ends_with("@example.test"));
/// ```
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Uuid::new_v4().simple())
}
