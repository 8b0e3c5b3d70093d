//! `php.config.services.applyProfile`: drop OAuth provider blocks from `config/services.php`

use super::{Profile, TransformContext};
use crate::error::Result;
use crate::source::php::{find_return_array, remove_entries_by_key};
use crate::source::EditSet;

pub const PROFILES: &[Profile] = &[Profile::NoMobile, Profile::BackendOnly];

fn target_services(profile: Profile) -> &'static [&'static str] {
    match profile {
        Profile::BackendOnly => &["google", "apple"],
        _ => &["apple"],
    }
}

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    let services = target_services(ctx.require_profile(PROFILES)?);
    let root = ctx.parse_php(source)?;
    let array = find_return_array(&root).ok_or_else(|| ctx.not_found("top-level return array"))?;

    let mut edits = EditSet::new();
    remove_entries_by_key(source, array, services, &mut edits);
    Ok(edits.apply(source)?)
}
