#![cfg(unix)]

mod common;
use crate::common::builders::{RequestBuilder, SettingsBuilder};
use crate::common::{collect_until_idle, init_tracing, wait_for_status, with_timeout};

use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use render_driver::types::{DriverStatus, Stage};
use render_driver::Driver;

type TestResult = Result<(), Box<dyn Error>>;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

const GENERATOR_OK: &str = r#"
test "$1" = "--filename" || exit 9
test -f "$2" || exit 8
echo "mc2pbrt: read $2"
echo "mc2pbrt: warning on stderr" >&2
echo "Film \"rgb\"" > scenes/target.pbrt
"#;

const RENDERER_OK: &str = r#"
test -f "$1" || exit 7
echo "pbrt version 3"
printf 'Rendering: [+++++       ]  (1.0s|2.0s)\r'
printf 'Rendering: [++++++++++++]  (3.5s)\n'
echo "png" > "$3"
"#;

#[tokio::test]
async fn real_stages_run_in_workdir_and_fill_the_log() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let generator = write_script(tmp.path(), "mc2pbrt", GENERATOR_OK);
    let renderer = write_script(tmp.path(), "pbrt", RENDERER_OK);
    let settings = SettingsBuilder::new(tmp.path())
        .generator(generator)
        .renderer(renderer)
        .build();
    let driver = Driver::new(settings)?;

    let mut transitions = driver.subscribe_transitions();
    driver.submit(RequestBuilder::new().build())?;
    let seen = with_timeout(collect_until_idle(&mut transitions)).await;
    assert_eq!(
        seen,
        vec![
            DriverStatus::Ready,
            DriverStatus::GeneratingScene,
            DriverStatus::Rendering,
            DriverStatus::Idle,
        ]
    );

    let outcome = driver.last_result().expect("outcome recorded");
    assert!(outcome.succeeded, "run failed: {outcome:?}");
    assert_eq!(driver.result_image()?, b"png\n");

    let log = driver.read_log(outcome.log_name.as_deref().unwrap())?;
    assert!(log.contains("mc2pbrt: read config.json"));
    assert!(log.contains("mc2pbrt: warning on stderr"));
    assert!(log.contains("pbrt version 3"));
    assert!(log.contains("(3.5s)"));
    Ok(())
}

#[tokio::test]
async fn failing_generator_stops_before_render() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let marker = tmp.path().join("renderer-ran");
    let generator = write_script(tmp.path(), "mc2pbrt", "echo 'bad world' >&2\nexit 3");
    let renderer = write_script(
        tmp.path(),
        "pbrt",
        &format!("touch {}", marker.display()),
    );
    let settings = SettingsBuilder::new(tmp.path())
        .generator(generator)
        .renderer(renderer)
        .build();
    let driver = Driver::new(settings)?;

    let mut transitions = driver.subscribe_transitions();
    driver.submit(RequestBuilder::new().build())?;
    let seen = with_timeout(collect_until_idle(&mut transitions)).await;
    assert!(!seen.contains(&DriverStatus::Rendering));

    let outcome = driver.last_result().unwrap();
    assert_eq!(outcome.failing_stage, Some(Stage::Generate));
    assert!(outcome.error.as_deref().unwrap().contains("status code 3"));
    assert!(!marker.exists());

    let log = driver.read_log(outcome.log_name.as_deref().unwrap())?;
    assert!(log.contains("bad world"));
    Ok(())
}

#[tokio::test]
async fn missing_generator_binary_fails_to_start() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let settings = SettingsBuilder::new(tmp.path())
        .generator(tmp.path().join("does-not-exist"))
        .build();
    let driver = Driver::new(settings)?;

    driver.submit(RequestBuilder::new().build())?;
    with_timeout(driver.wait_idle()).await;

    let outcome = driver.last_result().unwrap();
    assert!(!outcome.succeeded);
    assert_eq!(outcome.failing_stage, Some(Stage::Generate));
    assert!(outcome.error.unwrap().contains("failed to start"));
    Ok(())
}

#[tokio::test]
async fn cancel_kills_a_hung_renderer() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let generator = write_script(tmp.path(), "mc2pbrt", "exit 0");
    let renderer = write_script(
        tmp.path(),
        "pbrt",
        "printf 'Rendering: [++          ]  (1.0s|9.0s)\\r'\nexec sleep 30",
    );
    let settings = SettingsBuilder::new(tmp.path())
        .generator(generator)
        .renderer(renderer)
        .build();
    let driver = Driver::new(settings)?;

    let mut transitions = driver.subscribe_transitions();
    driver.submit(RequestBuilder::new().build())?;
    with_timeout(wait_for_status(&mut transitions, DriverStatus::Rendering)).await;

    with_timeout(async {
        while driver.status().progress.is_none() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await;
    let progress = driver.status().progress.unwrap();
    assert_eq!(progress.elapsed_secs, 1.0);
    assert_eq!(progress.remaining_secs, 9.0);

    driver.cancel();
    with_timeout(wait_for_status(&mut transitions, DriverStatus::Idle)).await;

    let outcome = driver.last_result().unwrap();
    assert!(!outcome.succeeded);
    assert_eq!(outcome.failing_stage, Some(Stage::Render));
    assert_eq!(outcome.error.as_deref(), Some("render stage failed: cancelled"));
    Ok(())
}

#[tokio::test]
async fn python_generator_goes_through_configured_interpreter() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    // A `.py` generator is launched as `<python> <script> --filename ...`;
    // pointing the interpreter at `sh` keeps the test free of Python.
    let generator = tmp.path().join("main.py");
    fs::write(&generator, "test \"$1\" = \"--filename\" || exit 9\necho generated-by-script\n")?;
    let renderer = write_script(tmp.path(), "pbrt", "exit 0");
    let mut settings = SettingsBuilder::new(tmp.path())
        .generator(&generator)
        .renderer(renderer)
        .build();
    settings.python = "sh".to_string();
    let driver = Driver::new(settings)?;

    driver.submit(RequestBuilder::new().build())?;
    with_timeout(driver.wait_idle()).await;

    let outcome = driver.last_result().unwrap();
    assert!(outcome.succeeded, "run failed: {outcome:?}");
    let log = driver.read_log(outcome.log_name.as_deref().unwrap())?;
    assert!(log.contains("generated-by-script"));
    Ok(())
}
