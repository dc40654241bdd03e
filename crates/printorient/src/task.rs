//! Running an orientation off the caller's thread.
//!
//! The search is synchronous and can take a while on large meshes, so hosts
//! with an interactive loop hand the mesh to a worker thread and poll for the
//! report. The mesh moves into the worker for the duration of the run and is
//! always handed back, rotated on success and untouched on failure. There is
//! no cancellation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, warn};

use crate::bake::BakeOutcome;
use crate::error::{OrientError, Result};
use crate::mesh::TriangleSoup;
use crate::{orient_mesh, OrientOutcome, OrientParams};

/// What a finished run hands back.
#[derive(Debug)]
pub struct TaskReport {
    /// The mesh, rotated if the run succeeded.
    pub mesh: TriangleSoup,
    /// Search and bake outcome.
    pub outcome: Result<OrientOutcome>,
}

struct Job {
    mesh: TriangleSoup,
    params: OrientParams,
}

/// A single orientation running on a dedicated worker thread.
pub struct OrientTask {
    reports: Receiver<TaskReport>,
}

impl OrientTask {
    /// Start orienting `mesh` in the background.
    ///
    /// On failure to start, the mesh is returned with the error.
    pub fn spawn(
        mesh: TriangleSoup,
        params: OrientParams,
    ) -> std::result::Result<Self, (OrientError, TriangleSoup)> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (report_tx, reports) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("printorient-search".into())
            .spawn(move || {
                let Ok(job) = job_rx.recv() else {
                    return;
                };
                // let the host observe the busy state before the search starts
                thread::yield_now();
                // the receiver may be gone if the caller dropped the task
                let _ = report_tx.send(run_guarded(job));
            });
        if let Err(e) = spawned {
            return Err((OrientError::Io(e), mesh));
        }

        job_tx
            .send(Job { mesh, params })
            .map_err(|mpsc::SendError(job)| (OrientError::WorkerDisconnected, job.mesh))?;
        Ok(Self { reports })
    }

    /// Collect the report if the run has finished.
    pub fn try_finish(&self) -> Option<std::result::Result<TaskReport, OrientError>> {
        match self.reports.try_recv() {
            Ok(report) => Some(Ok(report)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(OrientError::WorkerDisconnected)),
        }
    }

    /// Block until the run finishes.
    pub fn wait(self) -> Result<TaskReport> {
        self.reports
            .recv()
            .map_err(|_| OrientError::WorkerDisconnected)
    }
}

/// Run one job, turning a panic into a reported failure.
fn run_guarded(job: Job) -> TaskReport {
    let Job { mut mesh, params } = job;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| orient_mesh(&mut mesh, &params)))
        .unwrap_or_else(|payload| Err(OrientError::SearchPanicked(panic_message(&*payload))));
    if let Err(e) = &outcome {
        warn!(error = %e, "Orientation failed");
    }
    TaskReport { mesh, outcome }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

/// Status of the most recent orientation for a mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum OrientStatus {
    /// Nothing has run, or the last result was acknowledged.
    Idle,
    /// A search is in flight.
    Analyzing,
    /// The search found the mesh already pointing up.
    AlreadyOptimal,
    /// The mesh was rotated.
    Oriented,
    /// The run failed; the mesh is unchanged.
    Failed(String),
}

/// Owns a mesh and allows at most one orientation of it at a time.
pub struct OrientSlot {
    mesh: Option<TriangleSoup>,
    task: Option<OrientTask>,
    status: OrientStatus,
    last: Option<OrientOutcome>,
}

impl OrientSlot {
    /// Wrap a mesh.
    pub fn new(mesh: TriangleSoup) -> Self {
        Self {
            mesh: Some(mesh),
            task: None,
            status: OrientStatus::Idle,
            last: None,
        }
    }

    /// Current status.
    pub fn status(&self) -> &OrientStatus {
        &self.status
    }

    /// True while a run is in flight.
    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    /// The mesh, unless it is lent to a running search.
    pub fn mesh(&self) -> Option<&TriangleSoup> {
        self.mesh.as_ref()
    }

    /// Outcome of the last successful run.
    pub fn last_outcome(&self) -> Option<&OrientOutcome> {
        self.last.as_ref()
    }

    /// Start orienting the mesh. Fails with [`OrientError::Busy`] while a
    /// run is in flight, and with [`OrientError::MeshLost`] once a worker
    /// has died without handing the mesh back. Such a slot stays unusable.
    pub fn start(&mut self, params: OrientParams) -> Result<()> {
        if self.task.is_some() {
            return Err(OrientError::Busy);
        }
        let mesh = self.mesh.take().ok_or(OrientError::MeshLost)?;
        match OrientTask::spawn(mesh, params) {
            Ok(task) => {
                debug!("Orientation started");
                self.task = Some(task);
                self.status = OrientStatus::Analyzing;
                Ok(())
            }
            Err((e, mesh)) => {
                self.mesh = Some(mesh);
                Err(e)
            }
        }
    }

    /// Check for a finished run without blocking.
    pub fn poll(&mut self) -> &OrientStatus {
        if let Some(task) = &self.task {
            if let Some(report) = task.try_finish() {
                self.task = None;
                self.absorb(report);
            }
        }
        &self.status
    }

    /// Block until the in-flight run, if any, has finished.
    pub fn wait(&mut self) -> &OrientStatus {
        if let Some(task) = self.task.take() {
            let report = task.wait();
            self.absorb(report);
        }
        &self.status
    }

    /// Return a finished status to [`OrientStatus::Idle`].
    pub fn acknowledge(&mut self) {
        if self.task.is_none() {
            self.status = OrientStatus::Idle;
        }
    }

    fn absorb(&mut self, report: Result<TaskReport>) {
        match report {
            Ok(TaskReport { mesh, outcome }) => {
                self.mesh = Some(mesh);
                self.status = match outcome {
                    Ok(outcome) => {
                        let status = match outcome.bake {
                            BakeOutcome::AlreadyOptimal => OrientStatus::AlreadyOptimal,
                            BakeOutcome::Rotated(_) => OrientStatus::Oriented,
                        };
                        self.last = Some(outcome);
                        status
                    }
                    Err(e) => OrientStatus::Failed(e.to_string()),
                };
            }
            // the worker vanished with the mesh
            Err(e) => self.status = OrientStatus::Failed(e.to_string()),
        }
    }
}
