use std::{borrow::Cow, collections::BTreeSet};

/// The user a request is made on behalf of, as established by the session layer.
pub trait Identity: Send + Sync + 'static {
    fn is_authenticated(&self) -> bool;

    /// Whether the user holds every one of `permissions`.
    fn has_perms(&self, permissions: &Permissions) -> bool;
}

/// Gives a guard access to the identity behind the request being resolved.
pub trait ResolverContext {
    fn identity(&self) -> &dyn Identity;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl Identity for AnonymousUser {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn has_perms(&self, _permissions: &Permissions) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthenticatedUser {
    pub username: String,
    pub permissions: BTreeSet<String>,
    /// Superusers implicitly hold every permission.
    pub is_superuser: bool,
}

impl AuthenticatedUser {
    pub fn new(username: impl Into<String>) -> Self {
        AuthenticatedUser {
            username: username.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    #[must_use]
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

impl Identity for AuthenticatedUser {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn has_perms(&self, permissions: &Permissions) -> bool {
        self.is_superuser
            || permissions
                .iter()
                .all(|permission| self.permissions.contains(permission))
    }
}

/// One or more permission names, e.g. `"app.change_pet"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions(Vec<Cow<'static, str>>);

impl Permissions {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|permission| permission.as_ref())
    }
}

impl From<&'static str> for Permissions {
    fn from(permission: &'static str) -> Self {
        Permissions(vec![Cow::Borrowed(permission)])
    }
}

impl From<String> for Permissions {
    fn from(permission: String) -> Self {
        Permissions(vec![Cow::Owned(permission)])
    }
}

impl<const N: usize> From<[&'static str; N]> for Permissions {
    fn from(permissions: [&'static str; N]) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<Vec<String>> for Permissions {
    fn from(permissions: Vec<String>) -> Self {
        Permissions(permissions.into_iter().map(Cow::Owned).collect())
    }
}

impl<P: Into<Cow<'static, str>>> FromIterator<P> for Permissions {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Permissions(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, permission) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(permission)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_user_has_nothing() {
        assert!(!AnonymousUser.is_authenticated());
        assert!(!AnonymousUser.has_perms(&"app.view_pet".into()));
    }

    #[test]
    fn authenticated_user_needs_every_permission() {
        let user = AuthenticatedUser::new("bob").with_permission("app.view_pet");

        assert!(user.is_authenticated());
        assert!(user.has_perms(&"app.view_pet".into()));
        assert!(!user.has_perms(&["app.view_pet", "app.change_pet"].into()));
    }

    #[test]
    fn superuser_has_every_permission() {
        let user = AuthenticatedUser::new("root").superuser();
        assert!(user.has_perms(&["app.view_pet", "app.change_pet"].into()));
    }

    #[test]
    fn display_lists_permissions() {
        let permissions = Permissions::from(["a.b", "c.d"]);
        assert_eq!(permissions.to_string(), "a.b, c.d");
    }
}
