//! Single-flight slots and failure reporting of `JobExecutor`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use lasy_pipeline::{JobError, JobExecutor, JobKey, JobKind};
use tokio::sync::oneshot;

type Failures = Arc<Mutex<Vec<(JobKey, String)>>>;

fn recording_executor() -> (JobExecutor, Failures) {
    let failures: Failures = Arc::default();
    let sink = Arc::clone(&failures);
    let executor = JobExecutor::new(move |key, err| {
        sink.lock().unwrap().push((key, err.to_string()));
    });
    (executor, failures)
}

async fn explode() -> Result<(), JobError> {
    panic!("model exploded")
}

// ---------------------------------------------------------------------------
// Test: slots
// ---------------------------------------------------------------------------

#[test]
fn second_claim_for_same_project_and_kind_is_refused() {
    let executor = JobExecutor::logging();

    let slot = executor.try_claim(JobKind::Generation, 1);
    assert!(slot.is_some());
    assert!(executor.try_claim(JobKind::Generation, 1).is_none());
    assert!(executor.is_in_flight(JobKind::Generation, 1));
}

#[test]
fn kinds_and_projects_are_independent() {
    let executor = JobExecutor::logging();

    let _gen = executor.try_claim(JobKind::Generation, 1).unwrap();
    let _deploy = executor.try_claim(JobKind::Deployment, 1).unwrap();
    let _other = executor.try_claim(JobKind::Generation, 2).unwrap();

    assert_eq!(executor.in_flight_count(), 3);
}

#[test]
fn dropping_a_slot_releases_it() {
    let executor = JobExecutor::logging();

    let slot = executor.try_claim(JobKind::Deployment, 4).unwrap();
    drop(slot);

    assert!(!executor.is_in_flight(JobKind::Deployment, 4));
    assert!(executor.try_claim(JobKind::Deployment, 4).is_some());
}

// ---------------------------------------------------------------------------
// Test: dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slot_is_held_until_the_job_finishes() {
    let executor = JobExecutor::logging();
    let (release, gate) = oneshot::channel::<()>();

    let slot = executor.try_claim(JobKind::Generation, 7).unwrap();
    executor.dispatch(slot, async move {
        let _ = gate.await;
        Ok(())
    });

    assert!(executor.try_claim(JobKind::Generation, 7).is_none());

    release.send(()).unwrap();
    assert!(executor.shutdown(Duration::from_secs(5)).await);
    assert!(!executor.is_in_flight(JobKind::Generation, 7));
}

#[tokio::test]
async fn failed_job_reaches_the_failure_handler() {
    let (executor, failures) = recording_executor();

    let slot = executor.try_claim(JobKind::Deployment, 3).unwrap();
    executor.dispatch(slot, async { Err(JobError::ProjectGone(3)) });
    assert!(executor.shutdown(Duration::from_secs(5)).await);

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].0,
        JobKey {
            kind: JobKind::Deployment,
            project_id: 3
        }
    );
    assert_eq!(failures[0].1, "project 3 no longer exists");
}

#[tokio::test]
async fn panicking_job_is_reported_and_releases_its_slot() {
    let (executor, failures) = recording_executor();

    let slot = executor.try_claim(JobKind::Generation, 5).unwrap();
    executor.dispatch(slot, explode());
    assert!(executor.shutdown(Duration::from_secs(5)).await);

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.contains("model exploded"));
    drop(failures);

    assert!(executor.try_claim(JobKind::Generation, 5).is_some());
}

#[tokio::test]
async fn successful_job_is_not_reported() {
    let (executor, failures) = recording_executor();

    let slot = executor.try_claim(JobKind::Generation, 1).unwrap();
    executor.dispatch(slot, async { Ok(()) });
    assert!(executor.shutdown(Duration::from_secs(5)).await);

    assert!(failures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn shutdown_times_out_on_a_stuck_job() {
    let executor = JobExecutor::logging();
    let (_keep, gate) = oneshot::channel::<()>();

    let slot = executor.try_claim(JobKind::Deployment, 1).unwrap();
    executor.dispatch(slot, async move {
        let _ = gate.await;
        Ok(())
    });

    assert!(!executor.shutdown(Duration::from_millis(50)).await);
}

#[test]
fn panicked_error_message() {
    let err = JobError::Panicked("boom".into());
    assert_matches!(&err, JobError::Panicked(msg) if msg == "boom");
    assert_eq!(err.to_string(), "job panicked: boom");
}
