use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{read_to_string, write};
use tempfile::{tempdir, NamedTempFile};

const GOLDEN_PLAN: &str = r#"[[{"plugin":"gitlab","subtasks":[],"options":{"connectionId":1,"projectId":123,"transformationRules":{"prType":"hey,man,wasup"}}},{"plugin":"gitextractor","subtasks":null,"options":{"proxy":"","repoId":"gitlab:GitlabProject:1:123","url":"//git:123@HttpUrlToRepo"}}],[{"plugin":"refdiff","subtasks":null,"options":{"tagsLimit":10,"tagsOrder":"reverse semver","tagsPattern":"pattern"}}],[{"plugin":"dora","subtasks":null,"options":{"repoId":"gitlab:GitlabProject:1:123","tasks":["EnrichTaskEnv"],"transformation":{"environment":"pattern","environmentRegex":"xxxx"}}}]]"#;

/// Creates an offline blueprint: the single scope carries its repository inline.
fn create_offline_blueprint() -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp blueprint file failed");
    write(
        config.path(),
        r#"
connection:
  id: 1
  endpoint: "https://gitlab.com/api/v4/"
scopes:
  - entities: [CODE]
    options:
      projectId: 123
    transformation:
      prType: "hey,man,wasup"
      refdiff:
        tagsPattern: pattern
        tagsLimit: 10
        tagsOrder: reverse semver
      dora:
        environment: pattern
        environmentRegex: xxxx
    repository:
      id: 123
      http_url_to_repo: HttpUrlToRepo
"#,
    )
    .expect("Writing temp blueprint failed");
    config
}

#[test]
fn plan_cli_prints_golden_plan_offline() {
    let config = create_offline_blueprint();
    let mut cmd = Command::cargo_bin("blueprint-planner").expect("Binary exists");

    cmd.arg("plan")
        .arg("--offline")
        .arg("--config")
        .arg(config.path())
        .env("GITLAB_TOKEN", "123");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(GOLDEN_PLAN))
        .stdout(predicate::str::contains("trace_initialised").not());
}

#[test]
fn plan_cli_writes_output_file() {
    let config = create_offline_blueprint();
    let out_dir = tempdir().unwrap();
    let out_path = out_dir.path().join("plan.json");

    Command::cargo_bin("blueprint-planner")
        .expect("Binary exists")
        .arg("plan")
        .arg("--offline")
        .arg("--config")
        .arg(config.path())
        .arg("--output")
        .arg(&out_path)
        .env("GITLAB_TOKEN", "123")
        .assert()
        .success();

    assert_eq!(read_to_string(&out_path).unwrap(), GOLDEN_PLAN);
}

#[test]
fn plan_cli_offline_fails_for_scopes_without_inline_repository() {
    let config = NamedTempFile::new().unwrap();
    write(
        config.path(),
        "connection:\n  id: 1\n  endpoint: \"https://gitlab.com/api/v4/\"\nscopes:\n  - entities: [CODE]\n    options:\n      projectId: 9\n",
    )
    .unwrap();

    Command::cargo_bin("blueprint-planner")
        .expect("Binary exists")
        .arg("plan")
        .arg("--offline")
        .arg("--config")
        .arg(config.path())
        .env("GITLAB_TOKEN", "123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline mode"));
}

#[test]
fn plan_cli_fails_without_token() {
    let config = create_offline_blueprint();

    Command::cargo_bin("blueprint-planner")
        .expect("Binary exists")
        .arg("plan")
        .arg("--offline")
        .arg("--config")
        .arg(config.path())
        .env_remove("GITLAB_TOKEN")
        .current_dir(tempdir().unwrap().path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITLAB_TOKEN"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use blueprint_planner::cli::{run, Cli, Commands};

    // The blueprint path does not exist; run must still trace before failing.
    let cli = Cli {
        command: Commands::Plan {
            config: std::path::PathBuf::from("dummy.yaml"),
            output: None,
            pretty: false,
            offline: true,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
#[serial_test::serial]
async fn unusable_clone_url_is_logged_once() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use blueprint_planner::cli::{run, Cli, Commands};

    let config = NamedTempFile::new().expect("Creating temp blueprint file failed");
    write(
        config.path(),
        r#"
connection:
  id: 1
  endpoint: "https://gitlab.com/api/v4/"
scopes:
  - entities: [CODE]
    options:
      projectId: 123
    repository:
      id: 123
      http_url_to_repo: "mailto:someone@example.com"
"#,
    )
    .expect("Writing temp blueprint failed");
    std::env::set_var("GITLAB_TOKEN", "123");

    let cli = Cli {
        command: Commands::Plan {
            config: config.path().to_path_buf(),
            output: None,
            pretty: false,
            offline: true,
        },
    };
    let result = run(cli).await;
    std::env::remove_var("GITLAB_TOKEN");
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    let mentions = event_msgs
        .iter()
        .filter(|msg| msg.contains("mailto:someone@example.com"))
        .count();
    assert_eq!(mentions, 1, "Expected one event for the bad clone URL, got: {:?}", event_msgs);
}
