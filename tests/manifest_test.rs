mod common;

use common::write;
use tempfile::TempDir;
use tmplpress::error::Error;
use tmplpress::manifest::{manifest_path, template_root_of, Manifest, ReplaceRule, SkipRule};
use tmplpress::validator::{validate, validate_file, ValidationError};

const FULL_MANIFEST: &str = r#"{
  "$schema": "https://example.com/template.schema.json",
  "version": "0.1.0",
  "placeholders": {
    "appName": "Application name",
    "repoOrg": "Organization"
  },
  "skip": [
    "dir-to-skip",
    "*.md"
  ],
  "replace": [
    {
      "type": "directory",
      "target": "app",
      "placeholder": "appName"
    }
  ],
  "validation": [
    {
      "placeholder": "appName",
      "regexp": "^[a-z-]+$"
    }
  ]
}
"#;

#[test]
fn test_decode_full_manifest() {
    let manifest = Manifest::from_slice(FULL_MANIFEST.as_bytes()).unwrap();

    assert_eq!(manifest.version.as_deref(), Some("0.1.0"));
    let names: Vec<&str> = manifest.placeholders.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["appName", "repoOrg"]);
    assert_eq!(manifest.skip, vec![SkipRule::from("dir-to-skip"), SkipRule::Glob("*.md".into())]);
    assert_eq!(
        manifest.replace,
        vec![ReplaceRule::Directory { target: "app".into(), placeholder: "appName".into() }]
    );
    assert_eq!(manifest.validation[0].regexp, "^[a-z-]+$");
}

#[test]
fn test_save_preserves_bytes_and_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("template.json");
    std::fs::write(&path, FULL_MANIFEST).unwrap();

    let manifest = Manifest::load_file(&path).unwrap().unwrap();
    manifest.save_file(&path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), FULL_MANIFEST);
}

#[test]
fn test_missing_manifest() {
    let temp_dir = TempDir::new().unwrap();
    assert!(Manifest::load_file(temp_dir.path().join("template.json")).unwrap().is_none());
    assert_eq!(Manifest::from_template(temp_dir.path()).unwrap(), Manifest::default());
}

#[test]
fn test_decode_errors() {
    assert!(matches!(Manifest::from_slice(b"{ nope"), Err(Error::ManifestDecodeError(_))));
    assert!(matches!(
        Manifest::from_slice(br#"{"placeholders": {}, "unknown": 1}"#),
        Err(Error::ManifestDecodeError(_))
    ));
    assert!(matches!(
        Manifest::from_slice(br#"{"placeholders": {"a": 1}}"#),
        Err(Error::ManifestDecodeError(_))
    ));
}

#[test]
fn test_valid_manifest_has_no_violations() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "app/main.go", "package {{appName}}\n");
    let manifest = Manifest::from_slice(FULL_MANIFEST.as_bytes()).unwrap();

    assert_eq!(validate(&manifest, temp_dir.path()), vec![]);
}

#[test]
fn test_reports_every_violation() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "README.md", "x");
    let manifest = Manifest::from_slice(
        br#"{
            "placeholders": {"appName": ""},
            "skip": ["[broken"],
            "replace": [
                {"type": "directory", "target": "app", "placeholder": "appName"},
                {"type": "file", "target": "README.md", "placeholder": "missing"}
            ],
            "validation": [
                {"placeholder": "appName", "regexp": ""},
                {"placeholder": "appName", "regexp": "([a-z"},
                {"placeholder": "ghost", "regexp": ".*"}
            ]
        }"#,
    )
    .unwrap();

    let violations = validate(&manifest, temp_dir.path());

    assert!(violations.contains(&ValidationError::UnknownPlaceholder {
        rule: "replace",
        target: "README.md".into(),
        placeholder: "missing".into(),
    }));
    assert!(violations.contains(&ValidationError::EmptyPattern { placeholder: "appName".into() }));
    assert!(violations
        .iter()
        .any(|v| matches!(v, ValidationError::InvalidPattern { placeholder, .. } if placeholder == "appName")));
    assert!(violations.iter().any(
        |v| matches!(v, ValidationError::UnknownPlaceholder { placeholder, .. } if placeholder == "ghost")
    ));
    assert!(violations.iter().any(|v| matches!(v, ValidationError::InvalidSkip { .. })));
    assert!(violations.contains(&ValidationError::MissingTarget {
        kind: "directory",
        target: "app".into(),
    }));
    assert_eq!(violations.len(), 6);
}

#[test]
fn test_replace_target_kind_must_match() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "app", "a file, not a directory");
    let manifest = Manifest::from_slice(
        br#"{
            "placeholders": {"appName": ""},
            "replace": [{"type": "directory", "target": "app", "placeholder": "appName"}]
        }"#,
    )
    .unwrap();

    assert_eq!(
        validate(&manifest, temp_dir.path()),
        vec![ValidationError::MissingTarget { kind: "directory", target: "app".into() }]
    );
}

#[test]
fn test_validate_file_checks_schema() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "template.json", r#"{"skip": ["a"]}"#);

    match validate_file(temp_dir.path().join("template.json")) {
        Err(Error::ManifestValidationError(violations)) => {
            assert!(violations.iter().all(|v| matches!(v, ValidationError::Schema(_))));
            assert!(!violations.is_empty());
        }
        other => panic!("Expected ManifestValidationError, got {other:?}"),
    }
}

#[test]
fn test_validate_file_accepts_valid_template() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "template.json", FULL_MANIFEST);
    write(temp_dir.path(), "app/main.go", "package main\n");

    let manifest = validate_file(temp_dir.path().join("template.json")).unwrap();
    assert_eq!(manifest.placeholders.len(), 2);
}

#[test]
fn test_manifest_path_resolution() {
    let temp_dir = TempDir::new().unwrap();
    let path = manifest_path(Some(temp_dir.path())).unwrap();
    assert_eq!(path, temp_dir.path().join("template.json"));
    assert_eq!(template_root_of(&path), temp_dir.path());

    let explicit = temp_dir.path().join("custom.json");
    assert_eq!(manifest_path(Some(&explicit)).unwrap(), explicit);
    assert_eq!(template_root_of(std::path::Path::new("template.json")), std::path::Path::new("."));
}

#[cfg(unix)]
#[test]
fn test_save_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("template.json");
    let mode = |p: &std::path::Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;

    Manifest::default().save_file(&path).unwrap();
    assert_eq!(mode(path.as_path()), 0o644);

    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o664)).unwrap();
    let manifest = Manifest::from_slice(FULL_MANIFEST.as_bytes()).unwrap();
    manifest.save_file(&path).unwrap();
    assert_eq!(mode(path.as_path()), 0o664);
}

#[test]
fn test_unreadable_tree_is_not_a_missing_target() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = Manifest::from_slice(
        br#"{
            "placeholders": {"appName": ""},
            "replace": [{"type": "directory", "target": "app", "placeholder": "appName"}]
        }"#,
    )
    .unwrap();

    let violations = validate(&manifest, temp_dir.path().join("gone"));

    assert_eq!(violations.len(), 1);
    match &violations[0] {
        ValidationError::Unreadable { path, .. } => assert!(path.ends_with("gone")),
        other => panic!("Expected Unreadable, got {other:?}"),
    }
}
