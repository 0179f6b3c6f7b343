//! Rebuild orchestration: claim, snapshot, mesh, publish.
//!
//! Workers pull chunk rebuild jobs off a shared queue, run them through
//! the [`BuildCoordinator`] and push reports back for the caller to
//! drain once per frame or tick.
#![forbid(unsafe_code)]

mod coordinator;
mod pool;
mod surfaces;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use undine_cells::{ChunkCoord, LiquidType};
use undine_mesh::MeshError;

pub use coordinator::{BuildCoordinator, ChunkRebuild};
pub use pool::{PooledScratch, ScratchPool};
pub use surfaces::{
    ChunkSurfaces, ClaimGuard, LiquidSurface, SurfaceData, SurfacePoison, SurfaceStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Another job holds the build claim for this liquid type on this
    /// chunk. Recoverable: retry once the claim clears.
    AlreadyBuilding { liquid: LiquidType },
    /// The mesh wanted more vertices than 16-bit indices address. The
    /// previously published surface stays live.
    IndexOverflow { liquid: LiquidType, vertices: usize },
    /// The surface lock was poisoned by a panicking writer.
    SurfacePoisoned { liquid: LiquidType },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::AlreadyBuilding { liquid } => {
                write!(f, "{} surface is already being built", liquid)
            }
            RuntimeError::IndexOverflow { liquid, vertices } => {
                write!(f, "{} mesh overflowed 16-bit indices at {} vertices", liquid, vertices)
            }
            RuntimeError::SurfacePoisoned { liquid } => {
                write!(f, "{} surface lock is poisoned", liquid)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<MeshError> for RuntimeError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::IndexOverflow { liquid, vertices } => {
                RuntimeError::IndexOverflow { liquid, vertices }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct RebuildJob {
    pub coord: ChunkCoord,
    pub targets: Vec<LiquidType>,
    pub rev: u64,
    pub job_id: u64,
}

#[derive(Debug)]
pub struct RebuildOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub result: Result<ChunkRebuild, RuntimeError>,
    pub t_total_ms: u32,
}

fn log_rebuild_perf(out: &RebuildOut) {
    let Ok(rebuild) = &out.result else { return };
    let mut verts = [0usize; LiquidType::COUNT];
    for ty in LiquidType::MESHABLE {
        let Some(slot) = ty.slot() else { continue };
        if let Some(Ok(geo)) = rebuild.result_for(ty) {
            verts[slot] = geo.vertices;
        }
    }
    log::info!(
        target: "perf",
        "ms total={} liquid_rebuild coord={} cells={} faces={} water_v={} lava_v={}",
        out.t_total_ms,
        out.coord,
        rebuild.stats.cells,
        rebuild.stats.faces,
        verts[0],
        verts[1]
    );
}

fn process_rebuild_job(job: RebuildJob, coordinator: &BuildCoordinator, tx: &Sender<RebuildOut>) {
    let t_start = Instant::now();
    let result = coordinator.rebuild_chunk(job.coord, &job.targets);
    let t_total_ms = t_start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    let out = RebuildOut {
        coord: job.coord,
        rev: job.rev,
        job_id: job.job_id,
        result,
        t_total_ms,
    };
    log_rebuild_perf(&out);
    let _ = tx.send(out);
}

pub struct Runtime {
    job_tx: Sender<RebuildJob>,
    res_rx: Receiver<RebuildOut>,
    _pool: Arc<ThreadPool>,
    q_rebuild: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
    coordinator: Arc<BuildCoordinator>,
}

impl Runtime {
    pub fn new(coordinator: Arc<BuildCoordinator>) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8)
            .saturating_sub(1)
            .max(1);
        Self::with_workers(coordinator, workers)
    }

    pub fn with_workers(coordinator: Arc<BuildCoordinator>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<RebuildJob>();
        let (res_tx, res_rx) = unbounded::<RebuildOut>();
        let q_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_ctr = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("undine-liquid-{i}"))
                .build()
                .expect("liquid worker pool"),
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let coordinator = coordinator.clone();
            let q_rebuild = q_ctr.clone();
            let inflight = inflight_ctr.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q_rebuild.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    process_rebuild_job(job, coordinator.as_ref(), &tx);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        Self {
            job_tx,
            res_rx,
            _pool: pool,
            q_rebuild: q_ctr,
            inflight: inflight_ctr,
            workers,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &BuildCoordinator {
        &self.coordinator
    }

    pub fn submit_rebuild(&self, job: RebuildJob) {
        self.q_rebuild.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(job).is_err() {
            self.q_rebuild.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn drain_results(&self) -> Vec<RebuildOut> {
        self.res_rx.try_iter().collect()
    }

    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.q_rebuild.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }
}
