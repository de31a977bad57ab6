mod common;

use common::{read, write};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tmplpress::answers::{parse_answers, AnswerSet};
use tmplpress::config::UserConfig;
use tmplpress::error::Error;
use tmplpress::processor::{check_guard, is_rendered_segment_valid, FileOperation, Press};
use tmplpress::renderer::PlaceholderRenderer;
use tmplpress::validator::ValidationError;

fn press(
    template: &Path,
    output: &Path,
    answers: &str,
    force: bool,
) -> tmplpress::error::Result<Vec<FileOperation>> {
    press_with(&UserConfig::default(), template, output, answers, force)
}

fn press_with(
    config: &UserConfig,
    template: &Path,
    output: &Path,
    answers: &str,
    force: bool,
) -> tmplpress::error::Result<Vec<FileOperation>> {
    let renderer = PlaceholderRenderer::new();
    let answers: AnswerSet = parse_answers(answers).unwrap();
    Press::new(&renderer, config).run(template, output, &answers, force)
}

#[test_log::test]
fn test_press_renders_names_and_contents() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "template.json", r#"{"placeholders": {"name": "", "age": ""}}"#);
    write(&template, "hello-{{name}}.txt", "Age: {{age}}");

    let operations = press(&template, &output, r#"{"name": "Ann", "age": "30"}"#, false).unwrap();

    assert_eq!(
        operations,
        vec![FileOperation::Write { target: output.join("hello-Ann.txt"), content: "Age: 30".into() }]
    );
    assert_eq!(read(&output, "hello-Ann.txt"), "Age: 30");
    assert!(!output.join("template.json").exists());
}

#[test]
fn test_press_uses_defaults() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "template.json", r#"{"placeholders": {"appName": "demo", "org": ""}}"#);
    write(&template, "README.md", "{{appName}} by [{{org}}] {{undeclared}}");

    press(&template, &output, "{}", false).unwrap();

    assert_eq!(read(&output, "README.md"), "demo by [] ");
}

#[test]
fn test_press_matches_expected_tree() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    let expected = workspace.path().join("expected");
    write(
        &template,
        "template.json",
        r#"{
            "placeholders": {"appName": "", "org": "acme"},
            "skip": ["dir-to-skip", "*.log"],
            "replace": [{"type": "directory", "target": "app", "placeholder": "appName"}]
        }"#,
    );
    write(&template, "app/main.go", "package {{appName}}\n");
    write(&template, "docs/{{org}}.md", "# {{org}}\n");
    write(&template, "dir-to-skip/nested/{{appName}}.txt", "skipped");
    write(&template, "debug.log", "skipped");
    write(&template, ".git/HEAD", "ref: refs/heads/main\n");

    press(&template, &output, r#"{"appName": "web"}"#, false).unwrap();

    write(&expected, "web/main.go", "package web\n");
    write(&expected, "docs/acme.md", "# acme\n");
    assert!(!dir_diff::is_different(&output, &expected).unwrap());
}

#[test]
fn test_press_copies_excluded_and_binary_files() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "template.json", r#"{"placeholders": {"name": "x"}}"#);
    write(&template, "raw.tmpl", "{{name}} stays");
    let binary = [0x89, b'P', b'N', b'G', 0x00, b'{', b'{', b'n', b'a', b'm', b'e', b'}', b'}'];
    fs::write(template.join("logo.bin"), binary).unwrap();

    let config = UserConfig { exclude_file_extensions: vec!["TMPL".into()], ..UserConfig::default() };
    let operations = press_with(&config, &template, &output, "{}", false).unwrap();

    assert_eq!(read(&output, "raw.tmpl"), "{{name}} stays");
    assert_eq!(fs::read(output.join("logo.bin")).unwrap(), binary);
    assert!(operations.iter().all(|op| matches!(op, FileOperation::Copy { .. })));
}

#[test]
fn test_press_drops_empty_segments() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "template.json", r#"{"placeholders": {"optional": ""}}"#);
    write(&template, "{{optional}}/inner.txt", "dropped");
    write(&template, "kept.txt", "kept");

    press(&template, &output, "{}", false).unwrap();

    let entries: Vec<String> = fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["kept.txt"]);
}

#[test]
fn test_press_rejects_unsafe_segment() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "template.json", r#"{"placeholders": {"name": ""}}"#);
    write(&template, "a.txt", "first");
    write(&template, "{{name}}.txt", "escape");

    let result = press(&template, &output, r#"{"name": "../../etc/x"}"#, false);

    assert!(matches!(result, Err(Error::InvalidOutputPath { .. })));
    assert!(!output.exists());
}

#[test]
fn test_press_guard_violation() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    write(&template, "template.json", r#"{"placeholders": {}}"#);
    write(&template, "a.txt", "a");

    let inside = template.join("out");
    match press(&template, &inside, "{}", false) {
        Err(Error::GuardViolation { .. }) => (),
        other => panic!("Expected GuardViolation, got {other:?}"),
    }
    assert!(!inside.exists());

    assert!(matches!(press(&template, &template, "{}", true), Err(Error::GuardViolation { .. })));
    assert!(matches!(
        press(&template, workspace.path(), "{}", true),
        Err(Error::GuardViolation { .. })
    ));
}

#[test]
fn test_check_guard_normalizes_paths() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    fs::create_dir_all(&template).unwrap();

    assert!(check_guard(&template, workspace.path().join("out")).is_ok());
    assert!(check_guard(&template, workspace.path().join("out/../template/sub")).is_err());
    assert!(check_guard(&template, workspace.path().join("template-sibling")).is_ok());
}

#[test]
fn test_press_validation_failure_writes_nothing() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(
        &template,
        "template.json",
        r#"{
            "placeholders": {"appName": ""},
            "validation": [{"placeholder": "appName", "regexp": "^[a-z]+$"}]
        }"#,
    );
    write(&template, "a.txt", "{{appName}}");

    match press(&template, &output, r#"{"appName": "Not Valid"}"#, false) {
        Err(Error::ManifestValidationError(violations)) => {
            assert_eq!(
                violations,
                vec![ValidationError::ValueMismatch {
                    placeholder: "appName".into(),
                    value: "Not Valid".into(),
                    regexp: "^[a-z]+$".into(),
                }]
            );
        }
        other => panic!("Expected ManifestValidationError, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_press_existing_output_requires_force() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "a.txt", "new");
    write(&output, "a.txt", "old");

    assert!(matches!(
        press(&template, &output, "{}", false),
        Err(Error::OutputDirectoryExistsError { .. })
    ));
    assert_eq!(read(&output, "a.txt"), "old");

    press(&template, &output, "{}", true).unwrap();
    assert_eq!(read(&output, "a.txt"), "new");
}

#[test_log::test]
fn test_press_removes_partial_output() {
    let workspace = TempDir::new().unwrap();
    let template = workspace.path().join("template");
    let output = workspace.path().join("out");
    write(&template, "template.json", r#"{"placeholders": {"a": "same", "b": "same"}}"#);
    write(&template, "{{a}}/inner.txt", "inner");
    write(&template, "{{b}}", "collides with the directory");

    match press(&template, &output, "{}", false) {
        Err(Error::RenderIoError { path, .. }) => assert_eq!(path, output.join("same")),
        other => panic!("Expected RenderIoError, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_missing_template() {
    let workspace = TempDir::new().unwrap();
    let result = press(&workspace.path().join("nope"), &workspace.path().join("out"), "{}", false);
    assert!(matches!(result, Err(Error::TemplateDoesNotExistsError { .. })));
}

#[test]
fn test_is_rendered_segment_valid() {
    assert!(is_rendered_segment_valid("hello-Ann.txt"));
    assert!(!is_rendered_segment_valid(""));
    assert!(!is_rendered_segment_valid(".."));
    assert!(!is_rendered_segment_valid("a/b"));
    assert!(!is_rendered_segment_valid("a\\b"));
}

#[test]
fn test_operation_display() {
    let op = FileOperation::CreateDir { target: "out/web".into() };
    assert_eq!(op.to_string(), "Creating: 'out/web'");
    let op = FileOperation::Write { target: "out/a.txt".into(), content: String::new() };
    assert_eq!(op.to_string(), "Rendering: 'out/a.txt'");
}
