//! Concurrent task orchestration.
//!
//! Runs an ordered list of cataloger tasks concurrently against one
//! resolver, merges their relationship streams into the aggregate, and
//! reports exactly one terminal outcome. The shared `Artifacts` aggregate is
//! the only cross-task mutable state: each task writes a single field of it,
//! serialized through one narrowly-scoped lock.

use super::generic::{Cataloger, Environment};
use super::resolver::{all_locations, FileResolver};
use super::CancelToken;
use crate::bus::{Event, EventBus};
use crate::cleanup::CleanupGuard;
use crate::error::{Result, SbomForgeError};
use crate::model::{Artifacts, Relationship, Sbom};
use rayon::prelude::*;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Mutex;
use std::time::Duration;

/// One unit of concurrent execution within a run.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    /// Produce this task's artifacts into the shared aggregate and return
    /// its relationship claims.
    fn execute(
        &self,
        resolver: &dyn FileResolver,
        artifacts: &Mutex<Artifacts>,
        cancel: &CancelToken,
    ) -> Result<Vec<Relationship>>;
}

/// Runs one cataloger and merges its packages into the shared collection.
pub struct PackageTask {
    cataloger: Box<dyn Cataloger>,
    environment: Environment,
}

impl PackageTask {
    pub fn new(cataloger: Box<dyn Cataloger>, environment: Environment) -> Self {
        Self {
            cataloger,
            environment,
        }
    }
}

impl Task for PackageTask {
    fn name(&self) -> &str {
        self.cataloger.name()
    }

    fn execute(
        &self,
        resolver: &dyn FileResolver,
        artifacts: &Mutex<Artifacts>,
        cancel: &CancelToken,
    ) -> Result<Vec<Relationship>> {
        let result = self
            .cataloger
            .catalog(resolver, Some(&self.environment), cancel);

        // Any cataloger-level error is run-fatal; partial results are
        // dropped here rather than merged.
        if let Some(error) = result.error {
            return Err(error);
        }

        let mut guard = lock_artifacts(artifacts);
        for package in result.packages {
            guard.packages.add(package);
        }
        drop(guard);

        Ok(result.relationships)
    }
}

/// Records filesystem metadata for every indexed location.
pub struct FileMetadataTask;

impl Task for FileMetadataTask {
    fn name(&self) -> &str {
        "file-metadata-task"
    }

    fn execute(
        &self,
        resolver: &dyn FileResolver,
        artifacts: &Mutex<Artifacts>,
        cancel: &CancelToken,
    ) -> Result<Vec<Relationship>> {
        for location in all_locations(resolver)? {
            if cancel.is_cancelled() {
                return Err(SbomForgeError::Cancelled);
            }
            match resolver.file_metadata(&location) {
                Ok(metadata) => {
                    lock_artifacts(artifacts)
                        .file_metadata
                        .insert(location.coordinates.clone(), metadata);
                }
                Err(err) => {
                    tracing::warn!("unable to read metadata for {location}: {err}");
                }
            }
        }
        Ok(Vec::new())
    }
}

/// Computes content digests for every indexed location.
pub struct FileDigestsTask {
    algorithms: Vec<String>,
}

impl FileDigestsTask {
    pub fn new(algorithms: Vec<String>) -> Self {
        Self { algorithms }
    }
}

impl Task for FileDigestsTask {
    fn name(&self) -> &str {
        "file-digests-task"
    }

    fn execute(
        &self,
        resolver: &dyn FileResolver,
        artifacts: &Mutex<Artifacts>,
        cancel: &CancelToken,
    ) -> Result<Vec<Relationship>> {
        let algorithms: Vec<&str> = self.algorithms.iter().map(String::as_str).collect();
        let locations = all_locations(resolver)?;

        // Hashing is CPU-bound; fan the files out and take the aggregate
        // lock once per result.
        let digests: Vec<_> = locations
            .par_iter()
            .filter_map(|location| {
                if cancel.is_cancelled() {
                    return None;
                }
                match resolver.file_digests(location, &algorithms) {
                    Ok(digests) if !digests.is_empty() => {
                        Some((location.coordinates.clone(), digests))
                    }
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!("unable to digest {location}: {err}");
                        None
                    }
                }
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(SbomForgeError::Cancelled);
        }

        let mut guard = lock_artifacts(artifacts);
        for (coordinates, file_digests) in digests {
            guard.file_digests.insert(coordinates, file_digests);
        }
        Ok(Vec::new())
    }
}

fn lock_artifacts(artifacts: &Mutex<Artifacts>) -> std::sync::MutexGuard<'_, Artifacts> {
    match artifacts.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Run all tasks concurrently and merge their output into the aggregate.
///
/// Every task owns a dedicated relationship channel; once all tasks have
/// joined, the channels are drained in task order so the merged list does
/// not depend on scheduling. The first error received fails the run and the
/// remaining results are discarded.
pub fn run_tasks(
    tasks: &[Box<dyn Task>],
    resolver: &dyn FileResolver,
    sbom: &mut Sbom,
    bus: &EventBus,
    cancel: &CancelToken,
) -> Result<()> {
    let artifacts = Mutex::new(std::mem::take(&mut sbom.artifacts));
    let (err_tx, err_rx) = channel::<SbomForgeError>();
    let mut relationship_rxs: Vec<Receiver<Relationship>> = Vec::with_capacity(tasks.len());

    std::thread::scope(|scope| {
        for task in tasks {
            let (rel_tx, rel_rx) = channel::<Relationship>();
            relationship_rxs.push(rel_rx);
            let err_tx = err_tx.clone();
            let artifacts = &artifacts;
            scope.spawn(move || {
                bus.publish(Event::CatalogerTaskStarted {
                    name: task.name().to_string(),
                });
                match task.execute(resolver, artifacts, cancel) {
                    Ok(relationships) => {
                        for relationship in relationships {
                            if rel_tx.send(relationship).is_err() {
                                break;
                            }
                        }
                    }
                    Err(error) => {
                        tracing::warn!("task {} failed: {error}", task.name());
                        let _ = err_tx.send(error);
                    }
                }
            });
        }
    });
    drop(err_tx);

    sbom.artifacts = artifacts.into_inner().unwrap_or_else(|p| p.into_inner());

    // All tasks have joined; the first error wins and the rest of the run's
    // output is discarded.
    if let Some(error) = err_rx.try_iter().next() {
        return Err(error);
    }

    for rel_rx in relationship_rxs {
        sbom.relationships.extend(rel_rx.try_iter());
    }
    Ok(())
}

/// Drive a worker to its single terminal outcome.
///
/// Watches the worker's error channel and the event bus subscription
/// together: the `Exit` event's final action delivers the document, the
/// first worker error fails the run, and registered cleanup runs exactly
/// once on every path out.
pub fn event_loop(
    worker_errors: Receiver<SbomForgeError>,
    events: Receiver<Event>,
    cleanup: CleanupGuard,
) -> Result<()> {
    let mut outcome = Ok(());

    'outer: loop {
        match events.recv_timeout(Duration::from_millis(25)) {
            Ok(Event::Exit(action)) => {
                outcome = action.invoke();
                break;
            }
            Ok(event) => handle_event(&event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if let Ok(error) = worker_errors.try_recv() {
                    outcome = Err(error);
                }
                break;
            }
        }

        match worker_errors.try_recv() {
            Ok(error) => {
                outcome = Err(error);
                break;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                // Worker is done. A terminal event published just before it
                // finished may still be queued; drain before concluding.
                while let Ok(event) = events.try_recv() {
                    if let Event::Exit(action) = event {
                        outcome = action.invoke();
                        break 'outer;
                    }
                    handle_event(&event);
                }
                break;
            }
        }
    }

    cleanup.release();
    outcome
}

fn handle_event(event: &Event) {
    match event {
        Event::IndexingStarted { path } => tracing::info!("indexing {path}"),
        Event::CatalogerTaskStarted { name } => tracing::debug!("task started: {name}"),
        Event::UpdateAvailable { version } => {
            tracing::info!("a newer release is available: {version}");
        }
        Event::Exit(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FinalAction;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubTask {
        name: &'static str,
        fail: bool,
    }

    impl Task for StubTask {
        fn name(&self) -> &str {
            self.name
        }

        fn execute(
            &self,
            _resolver: &dyn FileResolver,
            _artifacts: &Mutex<Artifacts>,
            _cancel: &CancelToken,
        ) -> Result<Vec<Relationship>> {
            if self.fail {
                Err(SbomForgeError::config("stub task failure"))
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn test_run_tasks_with_no_tasks_succeeds() {
        let resolver = crate::catalog::MemoryResolver::new();
        let mut sbom = Sbom::default();
        let bus = EventBus::new();
        let result = run_tasks(&[], &resolver, &mut sbom, &bus, &CancelToken::new());
        assert!(result.is_ok());
    }

    #[test]
    fn test_failing_task_fails_run() {
        let resolver = crate::catalog::MemoryResolver::new();
        let mut sbom = Sbom::default();
        let bus = EventBus::new();
        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(StubTask {
                name: "ok-task",
                fail: false,
            }),
            Box::new(StubTask {
                name: "bad-task",
                fail: true,
            }),
        ];
        let result = run_tasks(&tasks, &resolver, &mut sbom, &bus, &CancelToken::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_event_loop_invokes_final_action() {
        let (err_tx, err_rx) = channel::<SbomForgeError>();
        let (event_tx, event_rx) = channel::<Event>();
        let calls = Arc::new(AtomicUsize::new(0));

        let action_calls = Arc::clone(&calls);
        event_tx
            .send(Event::Exit(FinalAction::new(move || {
                action_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })))
            .expect("send exit");
        drop(err_tx);
        drop(event_tx);

        let result = event_loop(err_rx, event_rx, CleanupGuard::new());
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_loop_surfaces_worker_error_and_cleans_up() {
        let (err_tx, err_rx) = channel::<SbomForgeError>();
        let (_event_tx, event_rx) = channel::<Event>();

        let cleaned = Arc::new(AtomicUsize::new(0));
        let cleanup = CleanupGuard::new();
        let cleanup_count = Arc::clone(&cleaned);
        cleanup.register(move || {
            cleanup_count.fetch_add(1, Ordering::SeqCst);
        });

        err_tx
            .send(SbomForgeError::config("worker blew up"))
            .expect("send error");
        drop(err_tx);

        let result = event_loop(err_rx, event_rx, cleanup);
        assert!(result.is_err());
        assert_eq!(cleaned.load(Ordering::SeqCst), 1, "cleanup must run on failure");
    }

    #[test]
    fn test_event_loop_finishes_when_worker_exits_silently() {
        let (err_tx, err_rx) = channel::<SbomForgeError>();
        let (event_tx, event_rx) = channel::<Event>();
        drop(err_tx);
        drop(event_tx);

        let result = event_loop(err_rx, event_rx, CleanupGuard::new());
        assert!(result.is_ok());
    }
}
