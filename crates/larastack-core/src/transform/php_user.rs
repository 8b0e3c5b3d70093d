//! `php.user.applyProfile`: strip API-token support from the User model

use super::{Profile, TransformContext};
use crate::error::Result;
use crate::source::php::{
    find_class, find_method, method_return_array, property_array, remove_entries_by_key,
    remove_entries_by_value, remove_trait_usage, remove_use_imports,
};
use crate::source::EditSet;

pub const PROFILES: &[Profile] = &[Profile::NoMobile, Profile::BackendOnly];

const TOKEN_IMPORT: &str = "Laravel\\Sanctum\\HasApiTokens";
const TOKEN_TRAIT: &str = "HasApiTokens";
const GOOGLE_TOKEN_FIELDS: &[&str] = &["google_token", "google_refresh_token"];

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    let profile = ctx.require_profile(PROFILES)?;
    let root = ctx.parse_php(source)?;
    let class = find_class(&root, source, None).ok_or_else(|| ctx.not_found("class declaration"))?;

    let mut edits = EditSet::new();
    remove_use_imports(source, &root, &[TOKEN_IMPORT], &mut edits);
    remove_trait_usage(source, class, TOKEN_TRAIT, &mut edits);

    if profile == Profile::BackendOnly {
        if let Some(hidden) = property_array(class, source, "hidden") {
            remove_entries_by_value(source, hidden, GOOGLE_TOKEN_FIELDS, &mut edits);
        }
        if let Some(casts) = find_method(class, source, "casts").and_then(method_return_array) {
            remove_entries_by_key(source, casts, GOOGLE_TOKEN_FIELDS, &mut edits);
        }
    }

    Ok(edits.apply(source)?)
}
