//! `php.routes.web.applyProfile`: empty `routes/web.php` when there is no frontend

use super::php_routes_api::EMPTY_PHP;
use super::{Profile, TransformContext};
use crate::error::Result;

pub const PROFILES: &[Profile] = &[Profile::NoFrontend];

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    ctx.require_profile(PROFILES)?;

    if source.trim() == EMPTY_PHP.trim() {
        return Ok(source.to_string());
    }
    Ok(EMPTY_PHP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing::run;

    #[test]
    fn test_routes_are_dropped() {
        let source = "<?php\n\nRoute::get('/', fn () => view('welcome'));\n";
        let out = run(apply, Some(Profile::NoFrontend), "backend", source).unwrap();
        assert_eq!(out, "<?php\n");
    }

    #[test]
    fn test_already_empty_file_is_left_alone() {
        let source = "<?php\n\n";
        let out = run(apply, Some(Profile::NoFrontend), "backend", source).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_profile_is_required() {
        assert!(run(apply, None, "backend", "<?php\n").is_err());
    }
}
