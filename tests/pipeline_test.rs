//! End-to-end tests driving a pipeline file through the public API.
#![cfg(unix)]

use std::fs;
use std::sync::Arc;

use pipegraph::config::load_pipeline;
use pipegraph::graph::{build_graph, build_partial_graph};
use pipegraph::params::{register_parameters, DeferredParameters};
use pipegraph::runner::run;
use pipegraph::steps::{steps_from_pipeline, Step};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const PIPELINE: &str = r#"
name: images
steps:
  - name: src
    description: Build the source image
    command: echo src >> journal && echo quay.io/ci/src:1 > src.ref
    creates:
      - kind: internal_image
        tag: src
    provides:
      SRC_IMAGE:
        file: src.ref
  - name: bin
    description: Build binaries
    command: echo "bin $SRC_IMAGE" >> journal
    parameters: [SRC_IMAGE]
    creates:
      - kind: internal_image
        tag: bin
  - name: test
    description: Run unit tests
    command: echo test >> journal
    requires:
      - kind: internal_image
        tag: bin
"#;

fn load(temp: &TempDir) -> (Arc<DeferredParameters>, Vec<Arc<dyn Step>>) {
    let path = temp.path().join("pipeline.yml");
    fs::write(&path, PIPELINE).unwrap();
    let pipeline = load_pipeline(&path).unwrap();
    let params = Arc::new(DeferredParameters::with_environment(Default::default()));
    let steps = steps_from_pipeline(&pipeline, &params);
    register_parameters(&params, &steps);
    (params, steps)
}

#[tokio::test]
async fn three_steps_run_in_dependency_order() {
    let temp = TempDir::new().unwrap();
    let (_params, steps) = load(&temp);

    // bin depends on src only through the parameter it consumes.
    assert_eq!(steps[1].requires().len(), 1);

    let graph = build_graph(&steps);
    let execution = run(&CancellationToken::new(), &graph, false).await;

    assert!(execution.success(), "{:?}", execution.error);
    assert_eq!(execution.suite.num_tests, 3);
    let journal = fs::read_to_string(temp.path().join("journal")).unwrap();
    assert_eq!(journal, "src\nbin quay.io/ci/src:1\ntest\n");
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let temp = TempDir::new().unwrap();
    let (_params, steps) = load(&temp);

    let graph = build_graph(&steps);
    let execution = run(&CancellationToken::new(), &graph, true).await;

    assert!(execution.success());
    assert_eq!(execution.suite.num_skipped, 3);
    assert!(!temp.path().join("journal").exists());
}

#[tokio::test]
async fn partial_run_skips_unneeded_steps() {
    let temp = TempDir::new().unwrap();
    let (_params, steps) = load(&temp);

    let graph = build_partial_graph(&steps, &["bin".to_string()]).unwrap();
    let execution = run(&CancellationToken::new(), &graph, false).await;

    assert!(execution.success());
    let journal = fs::read_to_string(temp.path().join("journal")).unwrap();
    assert_eq!(journal, "src\nbin quay.io/ci/src:1\n");
}

#[tokio::test]
async fn cancellation_stops_a_running_command() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipeline.yml");
    fs::write(
        &path,
        "steps:\n  - name: wait\n    command: sleep 30\n  - name: quick\n    command: 'true'\n",
    )
    .unwrap();
    let pipeline = load_pipeline(&path).unwrap();
    let params = Arc::new(DeferredParameters::with_environment(Default::default()));
    let steps = steps_from_pipeline(&pipeline, &params);

    let graph = build_graph(&steps);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let execution = run(&cancel, &graph, false).await;
    let err = execution.error.expect("cancelled run reports an error");
    assert!(err.is_cancelled());
    assert!(execution.suite.num_tests <= 2);
}
