use std::future::Future;

use error::SourceError;

use crate::{Identity, Permissions, ResolverContext};

/// A check run before a resolver. A failed check raises a permission denied error, which the error
/// formatter reports as `FORBIDDEN`.
#[derive(Debug, Clone)]
pub enum Guard {
    LoginRequired,
    PermissionRequired(Permissions),
}

impl Guard {
    pub fn login_required() -> Self {
        Guard::LoginRequired
    }

    pub fn permission_required(permissions: impl Into<Permissions>) -> Self {
        Guard::PermissionRequired(permissions.into())
    }

    pub fn check(&self, identity: &dyn Identity) -> Result<(), SourceError> {
        let allowed = match self {
            Guard::LoginRequired => identity.is_authenticated(),
            Guard::PermissionRequired(permissions) => identity.has_perms(permissions),
        };

        if allowed {
            Ok(())
        } else {
            tracing::debug!(guard = ?self, "Resolver access denied");
            Err(SourceError::permission_denied())
        }
    }

    /// Wraps a resolver so that it only runs once the guard passes. Arguments are forwarded as is.
    pub fn wrap<C, A, T, E, F>(self, resolver: F) -> impl Fn(&C, A) -> Result<T, E>
    where
        C: ResolverContext + ?Sized,
        E: From<SourceError>,
        F: Fn(&C, A) -> Result<T, E>,
    {
        move |ctx: &C, args: A| {
            self.check(ctx.identity())?;
            resolver(ctx, args)
        }
    }

    /// Awaits `resolve` only once the guard passes.
    pub async fn run<T, E, Fut>(&self, identity: &dyn Identity, resolve: Fut) -> Result<T, E>
    where
        E: From<SourceError>,
        Fut: Future<Output = Result<T, E>>,
    {
        self.check(identity)?;
        resolve.await
    }
}

pub fn login_required<C, A, T, E, F>(resolver: F) -> impl Fn(&C, A) -> Result<T, E>
where
    C: ResolverContext + ?Sized,
    E: From<SourceError>,
    F: Fn(&C, A) -> Result<T, E>,
{
    Guard::login_required().wrap(resolver)
}

pub fn permission_required<C, A, T, E, F>(
    permissions: impl Into<Permissions>,
    resolver: F,
) -> impl Fn(&C, A) -> Result<T, E>
where
    C: ResolverContext + ?Sized,
    E: From<SourceError>,
    F: Fn(&C, A) -> Result<T, E>,
{
    Guard::permission_required(permissions).wrap(resolver)
}

/// Awaits `resolve` only when `identity` is authenticated.
pub async fn login_required_async<T, E>(
    identity: &dyn Identity,
    resolve: impl Future<Output = Result<T, E>>,
) -> Result<T, E>
where
    E: From<SourceError>,
{
    Guard::LoginRequired.run(identity, resolve).await
}

pub async fn permission_required_async<T, E>(
    permissions: impl Into<Permissions>,
    identity: &dyn Identity,
    resolve: impl Future<Output = Result<T, E>>,
) -> Result<T, E>
where
    E: From<SourceError>,
{
    Guard::permission_required(permissions).run(identity, resolve).await
}
