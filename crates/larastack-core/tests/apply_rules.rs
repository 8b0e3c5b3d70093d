use larastack_core::{apply_rules, prune_ci_workflows, prune_for_modules, ModuleSet, RuleError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const USER_MODEL: &str = r#"<?php

namespace App\Models;

use Illuminate\Database\Eloquent\Factories\HasFactory;
use Illuminate\Notifications\Notifiable;
use Laravel\Sanctum\HasApiTokens;

class User
{
    use HasApiTokens, HasFactory, Notifiable;

    protected $hidden = [
        'password',
    ];
}
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_manifest(root: &Path, manifest: Value) {
    write(root, ".create-larastack/rules.json", &manifest.to_string());
}

fn modules(list: &str) -> ModuleSet {
    list.parse().unwrap()
}

#[tokio::test]
async fn test_unselected_module_folder_and_workflows_are_removed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "backend/artisan", "");
    write(root, "mobile/app.json", "{}");
    write(root, ".github/workflows/mobile-ci.yaml", "");
    write(root, ".github/workflows/backend-ci.yaml", "");

    apply_rules(root, &modules("backend")).await.unwrap();

    assert!(!root.join("mobile").exists());
    assert!(!root.join(".github/workflows/mobile-ci.yaml").exists());
    assert!(root.join("backend/artisan").exists());
    assert!(root.join(".github/workflows/backend-ci.yaml").exists());
}

#[tokio::test]
async fn test_user_model_trait_list_is_rewritten() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "backend/app/Models/User.php", USER_MODEL);
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [{
                "id": "transform-user-model",
                "when": { "allOf": [{ "appSelected": "backend" }, { "appNotSelected": "mobile" }] },
                "operations": [{
                    "type": "transform",
                    "path": "backend/app/Models/User.php",
                    "transform": "php.user.applyProfile",
                    "options": { "profile": "no-mobile" }
                }]
            }]
        }),
    );

    let summary = apply_rules(root, &modules("backend")).await.unwrap();
    assert_eq!(summary.files_rewritten, 1);

    let output = fs::read_to_string(root.join("backend/app/Models/User.php")).unwrap();
    let expected = USER_MODEL
        .replace("use Laravel\\Sanctum\\HasApiTokens;\n", "")
        .replace(
            "    use HasApiTokens, HasFactory, Notifiable;",
            "    use HasFactory, Notifiable;",
        );
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_unknown_transform_fails_before_any_change() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "mobile/app.json", "{}");
    write(root, "example.txt", "hello");
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [{
                "id": "bad-transform",
                "operations": [{ "type": "transform", "path": "example.txt", "transform": "text.shout" }]
            }]
        }),
    );

    let err = apply_rules(root, &modules("backend")).await.unwrap_err();
    assert!(err.is_validation());
    let message = err.to_string();
    assert!(message.contains("transform must be one of"), "{message}");
    assert!(message.contains("env.backend.applyProfile"), "{message}");

    // Default rules would have removed `mobile`; nothing ran.
    assert!(root.join("mobile/app.json").exists());
    assert!(root.join(".create-larastack/rules.json").exists());
    assert_eq!(fs::read_to_string(root.join("example.txt")).unwrap(), "hello");
}

#[tokio::test]
async fn test_transform_inside_removed_folder_fails() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "backend/app/Models/User.php", USER_MODEL);
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [
                { "id": "drop-backend", "operations": [{ "type": "remove", "paths": ["backend"] }] },
                {
                    "id": "rewrite-user",
                    "operations": [{
                        "type": "transform",
                        "path": "backend/app/Models/User.php",
                        "transform": "php.user.applyProfile",
                        "options": { "profile": "no-mobile" }
                    }]
                }
            ]
        }),
    );

    let err = apply_rules(root, &modules("backend")).await.unwrap_err();
    match err {
        RuleError::MissingTransformTarget { rule_id, path } => {
            assert_eq!(rule_id, "rewrite-user");
            assert_eq!(path, "backend/app/Models/User.php");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_glob_sees_files_created_by_earlier_rules() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "stubs/token_migration.php", "stub");
    write(root, "backend/database/migrations/0001_create_users.php", "users");
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [
                {
                    "id": "add-token-migration",
                    "operations": [{
                        "type": "copy",
                        "from": "stubs/token_migration.php",
                        "to": "backend/database/migrations/0002_personal_access_tokens.php"
                    }]
                },
                {
                    "id": "drop-token-migration",
                    "when": { "allOf": [{ "moduleNotSelected": "mobile" }] },
                    "operations": [{
                        "type": "remove",
                        "paths": ["backend/database/migrations/*personal_access_tokens*"]
                    }]
                }
            ]
        }),
    );

    let summary = apply_rules(root, &modules("backend")).await.unwrap();
    assert_eq!(summary.files_copied, 1);

    let migrations = root.join("backend/database/migrations");
    assert!(!migrations.join("0002_personal_access_tokens.php").exists());
    assert!(migrations.join("0001_create_users.php").exists());
}

#[tokio::test]
async fn test_glob_without_matches_is_noop() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "backend/keep.php", "");
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [{ "id": "nothing", "operations": [{ "type": "remove", "paths": ["backend/**/*.tmp", "gone"] }] }]
        }),
    );

    apply_rules(root, &modules("backend")).await.unwrap();
    assert!(root.join("backend/keep.php").exists());
}

#[tokio::test]
async fn test_default_rules_run_before_project_rules() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "mobile/app.json", "{}");
    write(root, "shared/config.json", "{}");
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [{
                "id": "restore-mobile-config",
                "operations": [{ "type": "copy", "from": "mobile/app.json", "to": "shared/app.json" }]
            }]
        }),
    );

    let err = apply_rules(root, &modules("backend")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Rule \"restore-mobile-config\" copy source does not exist: mobile/app.json"
    );
}

#[tokio::test]
async fn test_manifest_directory_is_removed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, ".create-larastack/notes.md", "internal");
    write_manifest(root, json!({ "version": 1, "rules": [] }));

    apply_rules(root, &modules("frontend,backend,mobile")).await.unwrap();
    assert!(!root.join(".create-larastack").exists());
}

#[tokio::test]
async fn test_missing_manifest_runs_defaults_only() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "frontend/package.json", "{}");

    let summary = apply_rules(root, &modules("backend,mobile")).await.unwrap();
    assert_eq!(summary.rules_matched, 1);
    assert_eq!(summary.rules_skipped, 2);
    assert!(!root.join("frontend").exists());
}

#[tokio::test]
async fn test_escaping_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("project");
    fs::create_dir_all(&root).unwrap();
    write(dir.path(), "outside.txt", "keep me");
    write_manifest(
        &root,
        json!({
            "version": 1,
            "rules": [{ "id": "escape", "operations": [{ "type": "remove", "paths": ["../outside.txt"] }] }]
        }),
    );

    let err = apply_rules(&root, &modules("backend")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Rule \"escape\" points outside target directory: ../outside.txt"
    );
    assert!(dir.path().join("outside.txt").exists());
}

#[tokio::test]
async fn test_path_naming_root_is_rejected() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "backend/artisan", "");
    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [{ "id": "wipe", "operations": [{ "type": "remove", "paths": ["./"] }] }]
        }),
    );

    let err = apply_rules(root, &modules("backend")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(root.join("backend/artisan").exists());
}

#[tokio::test]
async fn test_unchanged_transform_does_not_write() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let already_clean = USER_MODEL
        .replace("use Laravel\\Sanctum\\HasApiTokens;\n", "")
        .replace("HasApiTokens, ", "");
    write(root, "backend/app/Models/User.php", &already_clean);
    let file = root.join("backend/app/Models/User.php");
    let before = fs::metadata(&file).unwrap().modified().unwrap();

    write_manifest(
        root,
        json!({
            "version": 1,
            "rules": [{
                "id": "rewrite-user",
                "operations": [{
                    "type": "transform",
                    "path": "backend/app/Models/User.php",
                    "transform": "php.user.applyProfile",
                    "options": { "profile": "no-mobile" }
                }]
            }]
        }),
    );

    let summary = apply_rules(root, &modules("backend")).await.unwrap();
    assert_eq!(summary.files_rewritten, 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), already_clean);
    assert_eq!(fs::metadata(&file).unwrap().modified().unwrap(), before);
}

#[tokio::test]
async fn test_prune_for_modules_ignores_manifest() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "mobile/app.json", "{}");
    write_manifest(root, json!({ "version": 99 }));

    prune_for_modules(root, &modules("backend")).await.unwrap();
    assert!(!root.join("mobile").exists());
    assert!(root.join(".create-larastack/rules.json").exists());
}

#[tokio::test]
async fn test_prune_ci_workflows_for_unselected_modules() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for module in ["frontend", "backend", "mobile"] {
        write(root, &format!(".github/workflows/{module}-ci.yaml"), module);
    }

    prune_ci_workflows(root, &modules("frontend")).await.unwrap();

    let workflows = root.join(".github/workflows");
    assert!(workflows.join("frontend-ci.yaml").exists());
    assert!(!workflows.join("backend-ci.yaml").exists());
    assert!(!workflows.join("mobile-ci.yaml").exists());
}
