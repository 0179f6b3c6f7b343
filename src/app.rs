//! Headless demo loop: fill a basin, churn liquid edits each tick and
//! keep the published surfaces in step with the rebuild workers.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use undine_basin::{Basin, fill};
use undine_cells::{ChunkCoord, LiquidType, MAX_LEVEL};
use undine_mesh::LiquidVertex;
use undine_runtime::{BuildCoordinator, RebuildJob, RebuildOut, Runtime, RuntimeError, ScratchPool};

use crate::Args;
use crate::scenario::{self, Scenario};

#[derive(Debug, Default)]
pub struct RunReport {
    pub chunks: usize,
    pub builds_ok: usize,
    pub builds_failed: usize,
    pub retries: usize,
    pub uploads: usize,
}

/// xorshift64*, good enough to spread churn edits around the basin.
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        ((x.wrapping_mul(0x2545_F491_4F6C_DD1D)) >> 32) as u32
    }

    fn range(&mut self, n: usize) -> usize {
        (self.next_u32() as usize) % n.max(1)
    }
}

/// One random liquid edit. Returns the chunk to remesh, or None when the
/// edit landed in rock and changed nothing.
fn apply_churn(basin: &Basin, rng: &mut Rng, coords: &[ChunkCoord]) -> Option<ChunkCoord> {
    let coord = coords[rng.range(coords.len())];
    let (sx, sy, sz) = basin.chunk_dims();
    let (x, y, z) = (rng.range(sx), rng.range(sy), rng.range(sz));
    let roll = rng.next_u32() % 4;
    let changed = basin.edit(coord, |buf| {
        if buf.solids[buf.idx(x, y, z)] {
            return;
        }
        match roll {
            0 => buf.set_liquid(x, y, z, LiquidType::Water, MAX_LEVEL),
            1 => buf.set_liquid(x, y, z, LiquidType::Water, MAX_LEVEL / 2),
            2 => buf.set_liquid(x, y, z, LiquidType::Lava, MAX_LEVEL),
            _ => buf.set_liquid(x, y, z, LiquidType::None, 0),
        }
    });
    changed.then_some(coord)
}

fn submit(
    runtime: &Runtime,
    pending: &mut HashMap<u64, ChunkCoord>,
    next_job_id: &mut u64,
    coord: ChunkCoord,
    rev: u64,
) {
    let job_id = *next_job_id;
    *next_job_id += 1;
    pending.insert(job_id, coord);
    runtime.submit_rebuild(RebuildJob {
        coord,
        targets: LiquidType::MESHABLE.to_vec(),
        rev,
        job_id,
    });
}

fn absorb(out: RebuildOut, report: &mut RunReport, retry: &mut Vec<ChunkCoord>) {
    match out.result {
        Ok(rebuild) => {
            let mut failed = false;
            for ty in LiquidType::MESHABLE {
                if let Some(Err(err)) = rebuild.result_for(ty) {
                    failed = true;
                    log::error!("{} surface of {} failed: {}", ty, out.coord, err);
                }
            }
            if failed {
                report.builds_failed += 1;
            } else {
                report.builds_ok += 1;
            }
            log::debug!(
                "built {} in {} ms cells={} faces={}",
                out.coord,
                out.t_total_ms,
                rebuild.stats.cells,
                rebuild.stats.faces
            );
        }
        Err(RuntimeError::AlreadyBuilding { liquid }) => {
            log::debug!("{} still building {}, retrying", out.coord, liquid);
            report.retries += 1;
            retry.push(out.coord);
        }
        Err(err) => {
            report.builds_failed += 1;
            log::error!("rebuild of {} failed: {}", out.coord, err);
        }
    }
}

/// Copies every dirty published surface into the staging buffers, the
/// same pass a renderer would run to refresh its GPU copies.
fn upload_dirty(
    coordinator: &BuildCoordinator,
    staging_v: &mut Vec<LiquidVertex>,
    staging_i: &mut Vec<u16>,
) -> (usize, usize) {
    let store = coordinator.store();
    let mut uploads = 0usize;
    let mut vertices = 0usize;
    for coord in store.coords() {
        let Some(surfaces) = store.get(coord) else {
            continue;
        };
        for ty in LiquidType::MESHABLE {
            let Some(slot) = ty.slot() else { continue };
            let surface = surfaces.surface(slot);
            match surface.take_dirty() {
                Ok(true) => {
                    if let Ok((vc, _ic)) = surface.copy_geometry(staging_v, staging_i) {
                        uploads += 1;
                        vertices += vc;
                    }
                }
                Ok(false) => {}
                Err(_) => log::error!("{} surface of {} unreadable: lock poisoned", ty, coord),
            }
        }
    }
    (uploads, vertices)
}

fn spawn_scenario_watcher(path: String, tx: mpsc::Sender<()>) {
    std::thread::spawn(move || {
        use notify::{EventKind, RecursiveMode, Watcher};
        if let Ok(mut watcher) =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_)
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            })
        {
            let _ = watcher.watch(Path::new(&path), RecursiveMode::NonRecursive);
            loop {
                std::thread::sleep(Duration::from_secs(3600));
            }
        }
    });
}

pub fn run(args: &Args, mut scenario: Scenario) -> Result<RunReport, Box<dyn Error>> {
    let [sx, sy, sz] = scenario.chunk_size;
    let basin = Arc::new(Basin::new(sx, sy, sz, scenario.view));
    fill::generate_basin(&basin, &scenario.fill, scenario.grid[0], scenario.grid[1])?;
    let mut coords = basin.chunk_coords();
    log::info!(
        "basin ready: {} chunks of {}x{}x{} cells ({:?} fill, seed {})",
        coords.len(),
        sx,
        sy,
        sz,
        scenario.fill.mode,
        scenario.fill.seed
    );

    let workers = if args.workers > 0 {
        args.workers
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8)
            .saturating_sub(1)
            .max(1)
    };
    let coordinator = Arc::new(BuildCoordinator::new(
        basin.clone(),
        ScratchPool::with_capacity_from_workers(workers),
    ));
    let runtime = Runtime::with_workers(coordinator.clone(), workers);
    log::info!("runtime up: {} workers", runtime.workers);

    let (reload_tx, reload_rx) = mpsc::channel::<()>();
    if args.watch {
        spawn_scenario_watcher(args.scenario.clone(), reload_tx.clone());
    }

    let ticks = args.ticks.unwrap_or(scenario.ticks);
    let mut report = RunReport {
        chunks: coords.len(),
        ..Default::default()
    };
    let mut rng = Rng::new(scenario.fill.seed as u64);
    let mut next_job_id: u64 = 0;
    let mut rev: u64 = 1;
    let mut pending: HashMap<u64, ChunkCoord> = HashMap::new();
    let mut retry: Vec<ChunkCoord> = Vec::new();
    let mut staging_v: Vec<LiquidVertex> = Vec::new();
    let mut staging_i: Vec<u16> = Vec::new();

    for &coord in &coords {
        submit(&runtime, &mut pending, &mut next_job_id, coord, rev);
    }

    for tick in 0..ticks {
        std::thread::sleep(Duration::from_millis(scenario.tick_ms));

        // A changed scenario file applies between ticks: a new fill or view
        // forces a full remesh, churn knobs just take effect.
        if args.watch && reload_rx.try_recv().is_ok() {
            match scenario::load_from_path(Path::new(&args.scenario)) {
                Ok(next) => {
                    let mut remesh = false;
                    if next.chunk_size != scenario.chunk_size {
                        log::warn!(
                            "chunk_size changes need a restart, keeping {:?}",
                            scenario.chunk_size
                        );
                    }
                    if next.fill != scenario.fill || next.grid != scenario.grid {
                        log::info!("fill changed, regenerating the basin");
                        fill::generate_basin(&basin, &next.fill, next.grid[0], next.grid[1])?;
                        for coord in basin.chunk_coords() {
                            let keep = coord.cy == 0
                                && (0..next.grid[0]).contains(&coord.cx)
                                && (0..next.grid[1]).contains(&coord.cz);
                            if !keep {
                                basin.remove_chunk(coord);
                                coordinator.store().remove(coord);
                            }
                        }
                        coords = basin.chunk_coords();
                        report.chunks = coords.len();
                        scenario.fill = next.fill;
                        scenario.grid = next.grid;
                        remesh = true;
                    }
                    if next.view != scenario.view {
                        basin.set_opts(next.view);
                        scenario.view = next.view;
                        remesh = true;
                    }
                    scenario.edits_per_tick = next.edits_per_tick;
                    scenario.tick_ms = next.tick_ms;
                    scenario.sweep_reveal = next.sweep_reveal;
                    if remesh {
                        log::info!("scenario changed, remeshing every chunk");
                        rev += 1;
                        for &coord in &coords {
                            submit(&runtime, &mut pending, &mut next_job_id, coord, rev);
                        }
                    }
                }
                Err(err) => log::warn!("scenario reload failed: {}", err),
            }
        }

        // The reveal sweep drags the slice ceiling down one level per tick.
        if scenario.sweep_reveal {
            let reveal = sy as i32 - (tick as i32 % (sy as i32 + 1));
            let mut opts = basin.opts();
            opts.max_reveal_level = reveal;
            basin.set_opts(opts);
            log::debug!("reveal ceiling now {}", reveal);
            rev += 1;
            for &coord in &coords {
                submit(&runtime, &mut pending, &mut next_job_id, coord, rev);
            }
        }

        for out in runtime.drain_results() {
            pending.remove(&out.job_id);
            absorb(out, &mut report, &mut retry);
        }
        for coord in std::mem::take(&mut retry) {
            submit(&runtime, &mut pending, &mut next_job_id, coord, rev);
        }

        rev += 1;
        let mut touched: Vec<ChunkCoord> = Vec::new();
        for _ in 0..scenario.edits_per_tick {
            if let Some(coord) = apply_churn(&basin, &mut rng, &coords) {
                if !touched.contains(&coord) {
                    touched.push(coord);
                }
            }
        }
        for coord in touched {
            submit(&runtime, &mut pending, &mut next_job_id, coord, rev);
        }

        let (uploads, vertices) = upload_dirty(&coordinator, &mut staging_v, &mut staging_i);
        report.uploads += uploads;
        let (queued, inflight) = runtime.queue_debug_counts();
        log::info!(
            "tick {}: uploads={} verts={} queued={} inflight={}",
            tick,
            uploads,
            vertices,
            queued,
            inflight
        );
    }

    // Drain the tail so every submitted job reports in before we summarize.
    let deadline = Instant::now() + Duration::from_secs(30);
    while !pending.is_empty() && Instant::now() < deadline {
        for out in runtime.drain_results() {
            pending.remove(&out.job_id);
            absorb(out, &mut report, &mut retry);
        }
        for coord in std::mem::take(&mut retry) {
            submit(&runtime, &mut pending, &mut next_job_id, coord, rev);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    if !pending.is_empty() {
        log::warn!("{} rebuilds never reported back", pending.len());
    }

    let (uploads, _) = upload_dirty(&coordinator, &mut staging_v, &mut staging_i);
    report.uploads += uploads;

    log::info!(
        "done: {} chunks, {} builds ok, {} failed, {} claim retries, {} uploads",
        report.chunks,
        report.builds_ok,
        report.builds_failed,
        report.retries,
        report.uploads
    );
    Ok(report)
}
