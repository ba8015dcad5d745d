//! Typed configuration keys.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::format::Format;

/// Untyped identity of a configuration document: logical name plus storage path.
///
/// This is the registry's lookup identity. Two equal ids always resolve to
/// the same file because the path is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId {
    name: String,
    path: PathBuf,
}

impl KeyId {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Key for a configuration document bound to the typed shape `T`.
///
/// `T` only selects what [`Configuration::get`](crate::Configuration::get)
/// deserializes into; equality and hashing use the [`KeyId`] alone.
pub struct ConfigKey<T> {
    id: KeyId,
    _shape: PhantomData<fn() -> T>,
}

impl<T> ConfigKey<T> {
    /// Key stored at an explicit path.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: KeyId::new(name, path),
            _shape: PhantomData,
        }
    }

    /// Key stored at `<root>/<name>.<ext>` for the given format.
    pub fn in_dir(root: impl AsRef<Path>, name: impl Into<String>, format: Format) -> Self {
        let name = name.into();
        let path = root
            .as_ref()
            .join(format!("{}.{}", name, format.extension()));
        Self::new(name, path)
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn path(&self) -> &Path {
        self.id.path()
    }
}

// Manual impls: derives would require `T: Clone`/`T: PartialEq`.
impl<T> Clone for ConfigKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _shape: PhantomData,
        }
    }
}

impl<T> PartialEq for ConfigKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ConfigKey<T> {}

impl<T> Hash for ConfigKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ConfigKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey")
            .field("name", &self.id.name)
            .field("path", &self.id.path)
            .field("shape", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for ConfigKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Shape;

    #[test]
    fn test_keys_with_same_id_are_equal() {
        let a: ConfigKey<Shape> = ConfigKey::new("app", "/cfg/app.toml");
        let b: ConfigKey<Shape> = ConfigKey::new("app", "/cfg/app.toml");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
    }

    #[test]
    fn test_path_is_part_of_identity() {
        let a: ConfigKey<Shape> = ConfigKey::new("app", "/cfg/a.toml");
        let b: ConfigKey<Shape> = ConfigKey::new("app", "/cfg/b.toml");
        assert_ne!(a, b);
    }

    #[test]
    fn test_in_dir_uses_format_extension() {
        let key: ConfigKey<Shape> = ConfigKey::in_dir("/cfg", "app", Format::Yaml);
        assert_eq!(key.path(), Path::new("/cfg/app.yml"));
        assert_eq!(key.name(), "app");
    }
}
