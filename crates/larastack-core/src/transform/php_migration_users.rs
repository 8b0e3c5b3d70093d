//! `php.migration.users.applyProfile`: drop social-login columns from the users table

use super::{Profile, TransformContext};
use crate::error::Result;
use crate::source::php::{delete_statement_lines, schema_create_statements, table_column_name};
use crate::source::EditSet;

pub const PROFILES: &[Profile] = &[Profile::NoMobile, Profile::BackendOnly];

fn target_columns(profile: Profile) -> &'static [&'static str] {
    match profile {
        Profile::BackendOnly => &["google_id", "google_token", "google_refresh_token", "apple_id"],
        _ => &["apple_id"],
    }
}

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    let columns = target_columns(ctx.require_profile(PROFILES)?);
    let root = ctx.parse_php(source)?;

    let statements = schema_create_statements(&root, source, "users")
        .ok_or_else(|| ctx.not_found("Schema::create('users', ...) closure"))?;

    let targets: Vec<_> = statements
        .into_iter()
        .filter(|statement| {
            table_column_name(statement, source)
                .is_some_and(|column| columns.contains(&column.as_str()))
        })
        .collect();

    let mut edits = EditSet::new();
    delete_statement_lines(source, &targets, &mut edits);
    Ok(edits.apply(source)?)
}
