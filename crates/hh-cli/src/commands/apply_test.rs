use super::*;
use std::collections::HashMap;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const THREE_STATEMENTS: &str = "\
-- HouseHelp schema;
CREATE TABLE agencies (id UUID PRIMARY KEY);
CREATE TABLE households (id UUID PRIMARY KEY);
CREATE TABLE bookings (id UUID PRIMARY KEY);
";

fn lookup_from(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    move |name| map.get(name).cloned()
}

fn credentials_for(server: &MockServer) -> impl Fn(&str) -> Option<String> {
    lookup_from(&[
        (URL_VAR, server.uri()),
        (SERVICE_KEY_VAR, "service-key".to_string()),
    ])
}

fn global_for(dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: dir.display().to_string(),
        config: None,
    }
}

fn write_schema(dir: &Path, sql: &str) {
    std::fs::write(dir.join("supabase-schema.sql"), sql).unwrap();
}

fn exit_code(err: &anyhow::Error) -> Option<i32> {
    err.downcast_ref::<ExitCode>().map(|code| code.0)
}

async fn mount_rpc(server: &MockServer, template: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/exec_sql"))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_credentials_fail_before_reading_schema() {
    let dir = tempfile::tempdir().unwrap();
    let args = ApplyArgs {
        schema: Some("/nonexistent/schema.sql".to_string()),
        ..ApplyArgs::default()
    };

    let err = run(&args, &global_for(dir.path()), |_| None)
        .await
        .unwrap_err();

    // The schema path does not exist, so reaching the file would have
    // produced SchemaNotFound instead.
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::MissingCredentials { .. })
    ));
}

#[tokio::test]
async fn test_missing_credentials_exit_1_without_remote_calls() {
    let server = MockServer::start().await;
    mount_rpc(&server, ResponseTemplate::new(200), 0).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);

    let err = execute_with_env(&ApplyArgs::default(), &global_for(dir.path()), |_| None)
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), Some(EXIT_FATAL));
}

#[tokio::test]
async fn test_three_statements_succeed() {
    let server = MockServer::start().await;
    mount_rpc(&server, ResponseTemplate::new(200), 3).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);
    let global = global_for(dir.path());

    let result = run(&ApplyArgs::default(), &global, credentials_for(&server))
        .await
        .unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(result.summary.succeeded(), 3);
    assert_eq!(result.mode, ApplyMode::Lenient);
    assert!(result.summary.is_clean());
}

#[tokio::test]
async fn test_execute_exits_zero_on_success() {
    let server = MockServer::start().await;
    mount_rpc(&server, ResponseTemplate::new(204), 3).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);

    execute_with_env(
        &ApplyArgs::default(),
        &global_for(dir.path()),
        credentials_for(&server),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_missing_schema_file_exits_1() {
    let server = MockServer::start().await;
    mount_rpc(&server, ResponseTemplate::new(200), 0).await;

    let dir = tempfile::tempdir().unwrap();
    let global = global_for(dir.path());

    let err = run(&ApplyArgs::default(), &global, credentials_for(&server))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::SchemaNotFound { .. })
    ));

    let err = execute_with_env(&ApplyArgs::default(), &global, credentials_for(&server))
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), Some(EXIT_FATAL));
}

#[tokio::test]
async fn test_lenient_failures_still_exit_zero() {
    let server = MockServer::start().await;
    let body = r#"{"code": "42501", "message": "permission denied for schema public"}"#;
    mount_rpc(&server, ResponseTemplate::new(403).set_body_string(body), 3).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);

    execute_with_env(
        &ApplyArgs::default(),
        &global_for(dir.path()),
        credentials_for(&server),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_strict_failure_exits_4_after_one_call() {
    let server = MockServer::start().await;
    let body = r#"{"code": "42501", "message": "permission denied for schema public"}"#;
    mount_rpc(&server, ResponseTemplate::new(403).set_body_string(body), 1).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);
    let args = ApplyArgs {
        strict: true,
        ..ApplyArgs::default()
    };

    let err = execute_with_env(&args, &global_for(dir.path()), credentials_for(&server))
        .await
        .unwrap_err();
    assert_eq!(exit_code(&err), Some(EXIT_STATEMENT_FAILED));
}

#[tokio::test]
async fn test_settings_file_enables_strict_mode_and_custom_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/run_sql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);
    std::fs::write(
        dir.path().join("househelp.yml"),
        "rpc_function: run_sql\nmode: strict\n",
    )
    .unwrap();

    let result = run(
        &ApplyArgs::default(),
        &global_for(dir.path()),
        credentials_for(&server),
    )
    .await
    .unwrap();
    assert_eq!(result.mode, ApplyMode::Strict);
    assert_eq!(result.summary.succeeded(), 3);
}

#[tokio::test]
async fn test_rerun_against_applied_schema_exits_zero() {
    let server = MockServer::start().await;
    let body = r#"{"code": "42P07", "message": "relation already exists"}"#;
    mount_rpc(&server, ResponseTemplate::new(400).set_body_string(body), 6).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);
    let global = global_for(dir.path());

    for _ in 0..2 {
        execute_with_env(&ApplyArgs::default(), &global, credentials_for(&server))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_anon_key_fallback_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/exec_sql"))
        .and(wiremock::matchers::header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);
    let lookup = lookup_from(&[
        (URL_VAR, server.uri()),
        (ANON_KEY_VAR, "anon-key".to_string()),
    ]);

    let result = run(&ApplyArgs::default(), &global_for(dir.path()), lookup)
        .await
        .unwrap();
    assert_eq!(result.summary.succeeded(), 3);
}

#[tokio::test]
async fn test_zero_timeout_rejected() {
    let server = MockServer::start().await;
    mount_rpc(&server, ResponseTemplate::new(200), 0).await;

    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), THREE_STATEMENTS);
    let args = ApplyArgs {
        timeout: Some(0),
        ..ApplyArgs::default()
    };

    let err = run(&args, &global_for(dir.path()), credentials_for(&server))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timeout"));
}

#[test]
fn test_recovery_path_ignores_settings_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    // Invalid settings (unknown field) that would also relocate the schema
    std::fs::write(
        dir.path().join("househelp.yml"),
        "schema_path: custom.sql\nbogus: true\n",
    )
    .unwrap();
    let global = global_for(dir.path());

    let missing: anyhow::Error = CoreError::MissingCredentials {
        missing: vec![URL_VAR],
    }
    .into();
    assert_eq!(
        recovery_schema_path(&ApplyArgs::default(), &global, &missing),
        dir.path().join("supabase-schema.sql")
    );
}

#[test]
fn test_recovery_path_uses_settings_after_credentials() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("househelp.yml"), "schema_path: custom.sql\n").unwrap();
    let global = global_for(dir.path());

    let err = anyhow::anyhow!("Failed to load schema");
    assert_eq!(
        recovery_schema_path(&ApplyArgs::default(), &global, &err),
        dir.path().join("custom.sql")
    );
}

#[test]
fn test_already_exists_line_is_a_warning() {
    let statements = hh_core::split_statements("CREATE TABLE agencies (id UUID);");
    let result = StatementResult {
        index: 1,
        outcome: StatementOutcome::SkippedAlreadyExists,
        duration: Duration::from_millis(3),
    };

    let line = format_outcome(&statements[0], &result, 1);
    assert!(line.contains("⚠️"));
    assert!(line.contains("warning: already exists"));
    assert!(line.contains("[1/1]"));
}

#[test]
fn test_flags_override_settings() {
    let settings = Settings {
        probe_table: Some("_from_settings".to_string()),
        ..Settings::default()
    };
    let args = ApplyArgs {
        strict: true,
        probe_table: Some("_from_flag".to_string()),
        ..ApplyArgs::default()
    };

    let options = apply_options(&args, &settings);
    assert_eq!(options.mode, ApplyMode::Strict);
    assert_eq!(options.probe_table.as_deref(), Some("_from_flag"));

    let options = apply_options(&ApplyArgs::default(), &settings);
    assert_eq!(options.mode, ApplyMode::Lenient);
    assert_eq!(options.probe_table.as_deref(), Some("_from_settings"));
}
