//! `env.backend.applyProfile`: prune OAuth settings from the backend `.env.example`

use super::{Profile, TransformContext};
use crate::error::Result;

pub const PROFILES: &[Profile] = &[Profile::NoMobile, Profile::BackendOnly];

struct EnvEdits {
    remove: &'static [&'static str],
    set: &'static [(&'static str, &'static str)],
}

fn edits_for(profile: Profile) -> EnvEdits {
    match profile {
        Profile::BackendOnly => EnvEdits {
            remove: &[
                "FRONTEND_URL",
                "GOOGLE_CLIENT_ID",
                "GOOGLE_CLIENT_IOS_ID",
                "GOOGLE_CLIENT_SECRET",
                "GOOGLE_REDIRECT_URI",
                "GOOGLE_ALLOWED_CLIENT_IDS",
                "APPLE_CLIENT_ID",
                "APPLE_ALLOWED_CLIENT_IDS",
            ],
            set: &[],
        },
        _ => EnvEdits {
            remove: &["GOOGLE_CLIENT_IOS_ID", "APPLE_CLIENT_ID", "APPLE_ALLOWED_CLIENT_IDS"],
            set: &[("GOOGLE_ALLOWED_CLIENT_IDS", "\"${GOOGLE_CLIENT_ID}\"")],
        },
    }
}

/// Key of a `KEY=value` line; comments and blank lines have none
pub fn env_key(line: &str) -> Option<&str> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, _) = line.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

pub fn apply(ctx: &TransformContext<'_>, source: &str) -> Result<String> {
    let edits = edits_for(ctx.require_profile(PROFILES)?);

    let lines: Vec<String> = source
        .split('\n')
        .filter(|line| env_key(line).map_or(true, |key| !edits.remove.contains(&key)))
        .map(|line| {
            let replacement = env_key(line)
                .and_then(|key| edits.set.iter().find(|(k, _)| *k == key))
                .map(|(key, value)| format!("{}={}", key, value));
            replacement.unwrap_or_else(|| line.to_string())
        })
        .collect();

    let mut output = collapse_blank_lines(&lines.join("\n"));
    output.truncate(output.trim_end_matches('\n').len());
    output.push('\n');
    Ok(output)
}

/// Squash runs of three or more newlines into a single blank line
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing::run;
    use pretty_assertions::assert_eq;

    const ENV: &str = "APP_NAME=Larastack\nFRONTEND_URL=http://localhost:3000\n\n# Google\nGOOGLE_CLIENT_ID=\nGOOGLE_CLIENT_IOS_ID=\nGOOGLE_ALLOWED_CLIENT_IDS=\"${GOOGLE_CLIENT_ID},${GOOGLE_CLIENT_IOS_ID}\"\n\nAPPLE_CLIENT_ID=\nAPPLE_ALLOWED_CLIENT_IDS=\n\nMAIL_MAILER=log\n";

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("APP_NAME=x"), Some("APP_NAME"));
        assert_eq!(env_key(" SPACED = y"), Some("SPACED"));
        assert_eq!(env_key("# COMMENT=x"), None);
        assert_eq!(env_key("no separator"), None);
        assert_eq!(env_key("=value"), None);
    }

    #[test]
    fn test_no_mobile_rewrites_allowed_ids() {
        let out = run(apply, Some(Profile::NoMobile), "backend", ENV).unwrap();
        assert_eq!(
            out,
            "APP_NAME=Larastack\nFRONTEND_URL=http://localhost:3000\n\n# Google\nGOOGLE_CLIENT_ID=\nGOOGLE_ALLOWED_CLIENT_IDS=\"${GOOGLE_CLIENT_ID}\"\n\nMAIL_MAILER=log\n"
        );
    }

    #[test]
    fn test_backend_only_strips_oauth_keys() {
        let out = run(apply, Some(Profile::BackendOnly), "backend", ENV).unwrap();
        assert_eq!(out, "APP_NAME=Larastack\n\n# Google\n\nMAIL_MAILER=log\n");
    }

    #[test]
    fn test_output_is_stable() {
        let once = run(apply, Some(Profile::NoMobile), "backend", ENV).unwrap();
        let twice = run(apply, Some(Profile::NoMobile), "backend", &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }
}
