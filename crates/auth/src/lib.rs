//! Guards restricting GraphQL resolvers to authenticated users or to users holding permissions.

mod guard;
mod identity;

pub use guard::{login_required, login_required_async, permission_required, permission_required_async, Guard};
pub use identity::{AnonymousUser, AuthenticatedUser, Identity, Permissions, ResolverContext};
