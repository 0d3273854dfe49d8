//! Concurrent execution of a step graph.
//!
//! Each scheduled node runs in its own task and reports back with exactly
//! one [`Completion`] message. A single loop consumes those messages and is
//! the only code that touches the satisfied links, the pending count and
//! the report. Children start as soon as every one of their requirements
//! is matched by a link some completed step created. A child that requires
//! [`StepLink::AllSteps`] also waits until every one of its parents has
//! succeeded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{aggregate, PipegraphError, Result};
use crate::graph::{has_all_links, NodeId, StepGraph, StepLink};
use crate::runner::report::TestSuite;
use crate::steps::Step;

/// Reason recorded for steps that succeeded in dry-run mode.
pub const DRY_RUN_REASON: &str = "dry run";

/// Progress events emitted by the consuming loop.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step has been scheduled.
    StepStarting { name: &'a str, description: &'a str },
    /// A step reported back.
    StepFinished {
        name: &'a str,
        description: &'a str,
        duration: Duration,
        error: Option<&'a PipegraphError>,
    },
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Execution {
    /// One entry per step that was scheduled and reported back.
    pub suite: TestSuite,
    /// Links created by every step that succeeded.
    pub satisfied: Vec<StepLink>,
    /// Aggregate of step failures, plus cancellation if it happened.
    pub error: Option<PipegraphError>,
}

impl Execution {
    /// Whether every step that ran succeeded and nothing was cancelled.
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// The report on success, the aggregate error otherwise.
    pub fn into_result(self) -> Result<TestSuite> {
        match self.error {
            None => Ok(self.suite),
            Some(err) => Err(err),
        }
    }
}

struct Completion {
    node: NodeId,
    duration: Duration,
    result: Result<()>,
}

/// Run every root of `graph` and then every child whose requirements
/// become satisfied.
pub async fn run(cancel: &CancellationToken, graph: &StepGraph, dry_run: bool) -> Execution {
    run_with_progress(cancel, graph, dry_run, |_| {}).await
}

/// Like [`run`], calling `on_progress` from the consuming loop.
pub async fn run_with_progress(
    cancel: &CancellationToken,
    graph: &StepGraph,
    dry_run: bool,
    mut on_progress: impl FnMut(RunProgress<'_>),
) -> Execution {
    let start = Instant::now();
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    let mut suite = TestSuite::new("pipeline");
    let mut satisfied: Vec<StepLink> = Vec::new();
    let mut errors: Vec<PipegraphError> = Vec::new();
    let mut scheduled = vec![false; graph.len()];
    let mut pending = 0usize;
    let parent_counts = graph.parent_counts();
    let mut succeeded_parents = vec![0usize; graph.len()];

    for &root in graph.roots() {
        scheduled[root] = true;
        pending += 1;
        let step = graph.node(root).step();
        on_progress(RunProgress::StepStarting {
            name: step.name(),
            description: step.description(),
        });
        launch(root, Arc::clone(step), cancel.clone(), dry_run, tx.clone());
    }

    while pending > 0 {
        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(pending, "execution cancelled");
                errors.push(PipegraphError::Cancelled);
                break;
            }
            received = rx.recv() => match received {
                Some(completion) => completion,
                None => break,
            },
        };
        pending -= 1;

        let node = graph.node(completion.node);
        let step = node.step();
        on_progress(RunProgress::StepFinished {
            name: step.name(),
            description: step.description(),
            duration: completion.duration,
            error: completion.result.as_ref().err(),
        });

        match completion.result {
            Err(err) => {
                warn!(step = step.name(), "{} failed: {}", step.description(), err);
                suite.record_failure(step.description(), completion.duration, &err);
                errors.push(err);
            }
            Ok(()) => {
                info!(
                    step = step.name(),
                    "{} succeeded after {:.1}s",
                    step.description(),
                    completion.duration.as_secs_f64()
                );
                if dry_run {
                    suite.record_skip(step.description(), completion.duration, DRY_RUN_REASON);
                } else {
                    suite.record_success(step.description(), completion.duration);
                }

                for link in step.creates() {
                    if !satisfied.iter().any(|have| have.same(&link)) {
                        satisfied.push(link);
                    }
                }

                for &child in node.children() {
                    succeeded_parents[child] += 1;
                    if scheduled[child] {
                        continue;
                    }
                    let child_step = graph.node(child).step();
                    let requires = child_step.requires();
                    if requires.contains(&StepLink::AllSteps)
                        && succeeded_parents[child] < parent_counts[child]
                    {
                        debug!(
                            step = child_step.name(),
                            remaining = parent_counts[child] - succeeded_parents[child],
                            "waiting for every parent to succeed"
                        );
                        continue;
                    }
                    if !has_all_links(&satisfied, &requires) {
                        debug!(
                            step = child_step.name(),
                            "requirements not yet satisfied"
                        );
                        continue;
                    }
                    scheduled[child] = true;
                    pending += 1;
                    on_progress(RunProgress::StepStarting {
                        name: child_step.name(),
                        description: child_step.description(),
                    });
                    launch(child, Arc::clone(child_step), cancel.clone(), dry_run, tx.clone());
                }
            }
        }
    }

    suite.finish(start.elapsed());
    Execution {
        suite,
        satisfied,
        error: aggregate(errors).err(),
    }
}

fn launch(
    node: NodeId,
    step: Arc<dyn Step>,
    cancel: CancellationToken,
    dry_run: bool,
    tx: mpsc::UnboundedSender<Completion>,
) {
    info!(step = step.name(), "Running {}", step.description());
    tokio::spawn(async move {
        let start = Instant::now();
        let name = step.name().to_string();
        let result = match tokio::spawn(async move { step.run(cancel, dry_run).await }).await {
            Ok(result) => result,
            Err(join_err) => Err(PipegraphError::StepFailed {
                step: name,
                message: format!("step task aborted: {}", join_err),
                output: None,
            }),
        };
        // The consumer may already have returned after a cancellation.
        let _ = tx.send(Completion {
            node,
            duration: start.elapsed(),
            result,
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::steps::testing::FakeStep;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn empty_graph_succeeds() {
        let graph = build_graph(&[]);
        let execution = run(&CancellationToken::new(), &graph, false).await;
        assert!(execution.success());
        assert_eq!(execution.suite.num_tests, 0);
    }

    #[tokio::test]
    async fn chain_runs_in_order() {
        let steps = vec![
            FakeStep::new("a")
                .requires(vec![StepLink::external("ocp", "base", "latest")])
                .creates(vec![StepLink::internal("root")])
                .into_step(),
            FakeStep::new("b")
                .requires(vec![StepLink::internal("root")])
                .creates(vec![StepLink::internal("src")])
                .into_step(),
            FakeStep::new("c")
                .requires(vec![StepLink::internal("src")])
                .creates(vec![StepLink::internal("bin")])
                .into_step(),
        ];
        let graph = build_graph(&steps);
        let mut order = Vec::new();
        let execution = run_with_progress(&CancellationToken::new(), &graph, false, |event| {
            if let RunProgress::StepStarting { name, .. } = event {
                order.push(name.to_string());
            }
        })
        .await;

        assert!(execution.success());
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(execution.suite.num_tests, 3);
        assert_eq!(execution.suite.num_failed, 0);
        assert_eq!(
            execution.satisfied,
            vec![
                StepLink::internal("root"),
                StepLink::internal("src"),
                StepLink::internal("bin"),
            ]
        );
    }

    #[tokio::test]
    async fn shared_child_waits_for_both_parents() {
        let slow = FakeStep::new("slow")
            .creates(vec![StepLink::internal("slow")])
            .delay(Duration::from_millis(50));
        let fast = FakeStep::new("fast").creates(vec![StepLink::internal("fast")]);
        let join = FakeStep::new("join")
            .requires(vec![StepLink::internal("slow"), StepLink::internal("fast")]);
        let join_runs = join.runs();
        let graph = build_graph(&[slow.into_step(), fast.into_step(), join.into_step()]);

        let mut finished = Vec::new();
        let execution = run_with_progress(&CancellationToken::new(), &graph, false, |event| {
            if let RunProgress::StepFinished { name, .. } = event {
                finished.push(name.to_string());
            }
        })
        .await;

        assert!(execution.success());
        assert_eq!(join_runs.load(Ordering::SeqCst), 1);
        assert_eq!(finished.last().map(String::as_str), Some("join"));
    }

    #[tokio::test]
    async fn all_steps_requirement_waits_for_every_parent() {
        let slow = FakeStep::new("slow")
            .creates(vec![StepLink::internal("slow")])
            .delay(Duration::from_millis(300));
        let fast = FakeStep::new("fast").creates(vec![StepLink::RpmRepo]);
        let promote = FakeStep::new("promote").requires(vec![StepLink::AllSteps]);
        let promote_runs = promote.runs();
        let graph = build_graph(&[slow.into_step(), fast.into_step(), promote.into_step()]);

        let mut finished = Vec::new();
        let execution = run_with_progress(&CancellationToken::new(), &graph, false, |event| {
            if let RunProgress::StepFinished { name, .. } = event {
                finished.push(name.to_string());
            }
        })
        .await;

        assert!(execution.success());
        assert_eq!(promote_runs.load(Ordering::SeqCst), 1);
        assert_eq!(finished, vec!["fast", "slow", "promote"]);
    }

    #[tokio::test]
    async fn all_steps_requirement_never_runs_after_a_parent_fails() {
        let bad = FakeStep::new("bad")
            .creates(vec![StepLink::internal("bad")])
            .delay(Duration::from_millis(50))
            .fails("boom", None);
        let good = FakeStep::new("good").creates(vec![StepLink::RpmRepo]);
        let promote = FakeStep::new("promote").requires(vec![StepLink::AllSteps]);
        let promote_runs = promote.runs();
        let graph = build_graph(&[bad.into_step(), good.into_step(), promote.into_step()]);

        let execution = run(&CancellationToken::new(), &graph, false).await;

        assert!(execution.error.is_some());
        assert_eq!(promote_runs.load(Ordering::SeqCst), 0);
        assert_eq!(execution.suite.num_tests, 2);
    }

    #[tokio::test]
    async fn single_failure_is_returned_verbatim() {
        let steps = vec![FakeStep::new("bad").fails("boom", Some("log line")).into_step()];
        let graph = build_graph(&steps);
        let execution = run(&CancellationToken::new(), &graph, false).await;

        let err = execution.error.unwrap();
        assert!(matches!(err, PipegraphError::StepFailed { .. }));
        assert_eq!(execution.suite.num_failed, 1);
        assert!(execution.suite.test_cases[0]
            .failure
            .as_deref()
            .unwrap()
            .contains("log line"));
    }

    #[tokio::test]
    async fn several_failures_are_aggregated() {
        let steps = vec![
            FakeStep::new("one").fails("first", None).into_step(),
            FakeStep::new("two").fails("second", None).into_step(),
        ];
        let graph = build_graph(&steps);
        let execution = run(&CancellationToken::new(), &graph, false).await;

        match execution.error {
            Some(PipegraphError::Aggregate { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected aggregate error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn dry_run_marks_success_as_skipped() {
        let step = FakeStep::new("build").creates(vec![StepLink::ImagesReady]);
        let mutated = step.mutated();
        let graph = build_graph(&[step.into_step()]);
        let execution = run(&CancellationToken::new(), &graph, true).await;

        assert!(execution.success());
        assert_eq!(execution.suite.num_skipped, 1);
        assert_eq!(
            execution.suite.test_cases[0].skipped.as_deref(),
            Some(DRY_RUN_REASON)
        );
        assert!(!mutated.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancellation_returns_partial_report() {
        let quick = FakeStep::new("quick");
        let hanging = FakeStep::new("hanging").hangs();
        let graph = build_graph(&[quick.into_step(), hanging.into_step()]);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let execution = run(&cancel, &graph, false).await;
        let err = execution.error.unwrap();
        assert!(err.is_cancelled());
        assert_eq!(execution.suite.num_tests, 1);
        assert_eq!(execution.suite.test_cases[0].name, "quick step");
    }

    #[tokio::test]
    async fn panicking_step_is_reported_as_failure() {
        struct Panics;

        #[async_trait::async_trait]
        impl Step for Panics {
            async fn inputs(
                &self,
                _cancel: &CancellationToken,
                _dry_run: bool,
            ) -> Result<crate::steps::InputDefinition> {
                Ok(Vec::new())
            }
            async fn run(&self, _cancel: CancellationToken, _dry_run: bool) -> Result<()> {
                panic!("step exploded");
            }
            async fn done(&self) -> Result<bool> {
                Ok(false)
            }
            fn name(&self) -> &str {
                "panics"
            }
            fn description(&self) -> &str {
                "panicking step"
            }
            fn requires(&self) -> Vec<StepLink> {
                Vec::new()
            }
            fn creates(&self) -> Vec<StepLink> {
                Vec::new()
            }
            fn provides(&self) -> (crate::steps::ParameterMap, Option<StepLink>) {
                (Default::default(), None)
            }
        }

        let graph = build_graph(&[Arc::new(Panics) as Arc<dyn Step>]);
        let execution = run(&CancellationToken::new(), &graph, false).await;
        assert_eq!(execution.suite.num_failed, 1);
        assert!(execution.error.is_some());
    }
}
