//! Shared identity types: originators and lock keys.

use std::fmt;
use std::rc::Rc;

/// Identity of the component or call site that performed a write.
///
/// Originators are recorded on every value and preset write so that
/// "who set this" is always answerable. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Originator(Rc<str>);

impl Originator {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Rc::from(name.as_ref()))
    }

    /// The originator used when no identity was supplied.
    pub fn unknown() -> Self {
        Self(Rc::from("unknown"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Originator {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Originator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Originator {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Originator {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// An unforgeable lock token.
///
/// A parameter locked with a key can only be written or unlocked with a
/// clone of that same key. Equality is identity, not structure: two
/// separately created keys never compare equal.
#[derive(Debug, Clone)]
pub struct LockKey(Rc<()>);

impl LockKey {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Rc::new(()))
    }
}

impl PartialEq for LockKey {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for LockKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_identity() {
        let a = LockKey::new();
        let b = LockKey::new();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_originator_default() {
        assert_eq!(Originator::default().name(), "unknown");
        assert_eq!(Originator::from("module.sub").to_string(), "module.sub");
    }
}
