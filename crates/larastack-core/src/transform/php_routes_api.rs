//! `php.routes.api.applyProfile`: drop mobile auth endpoints from `routes/api.php`

use super::{Profile, TransformContext};
use crate::error::Result;
use crate::source::php::{delete_statement_lines, remove_use_imports, route_path};
use crate::source::EditSet;

pub const PROFILES: &[Profile] = &[Profile::NoMobile, Profile::BackendOnly];

/// Placeholder left behind when a routes file is emptied
pub(crate) const EMPTY_PHP: &str = "<?php\n";

const MOBILE_CONTROLLERS: &[&str] = &[
    "App\\Http\\Controllers\\Auth\\MobileAppleAuthController",
    "App\\Http\\Controllers\\Auth\\MobileGoogleAuthController",
    "App\\Http\\Controllers\\Auth\\MobileTokenController",
];

const MOBILE_ROUTES: &[&str] = &[
    "/auth/apple/mobile",
    "/auth/google/mobile",
    "/auth/mobile/logout",
];

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    match ctx.require_profile(PROFILES)? {
        Profile::BackendOnly => Ok(EMPTY_PHP.to_string()),
        _ => {
            let root = ctx.parse_php(source)?;
            let mut edits = EditSet::new();

            remove_use_imports(source, &root, MOBILE_CONTROLLERS, &mut edits);

            let routes: Vec<_> = root
                .find_kind("expression_statement")
                .into_iter()
                .filter(|statement| {
                    route_path(statement, source)
                        .is_some_and(|path| MOBILE_ROUTES.contains(&path.as_str()))
                })
                .collect();
            delete_statement_lines(source, &routes, &mut edits);

            Ok(edits.apply(source)?)
        }
    }
}
