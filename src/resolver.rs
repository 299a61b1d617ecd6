//! Frame resolution entry point.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::LayeringConfig;
use crate::decision::FrameDecision;
use crate::diagnostics::Diagnostics;
use crate::foundation::core::{FrameSeq, MAX_PIPES, PipeId};
use crate::foundation::error::{ErrorKind, LayeringError, LayeringResult};
use crate::layering::bandwidth::{RatioCache, reduce_to_worst_tier, sweep_frame};
use crate::layering::capacity::{CapacityVerdict, fit_to_slots};
use crate::layering::clear::promote_clear_layer;
use crate::layering::dispatch::{EngineSlot, dispatch_pipe};
use crate::layering::gles::Stage;
use crate::layering::grouping::group_ext_layers;
use crate::layering::inactive::cache_inactive;
use crate::layering::layer::{Frame, PipeLayers};
use crate::layering::resize::{ResizeScenario, resize_pipe};
use crate::layering::sweep::SweepArena;
use crate::request::model::LayeringRequest;
use crate::request::normalize::normalize_request;
use crate::request::validate::validate_request;
use crate::topology::{PipeTopology, Topology};

/// State carried from one frame to the next.
struct ResolverState {
    arena: SweepArena,
    sequence: FrameSeq,
    ratios: RatioCache,
    /// Decoupled-offload slot committed by the previous frame, per pipe.
    committed: [Option<EngineSlot>; MAX_PIPES],
    diagnostics: Diagnostics,
}

/// Per-frame hardware overlay resolver.
///
/// One resolver serves one display controller. Calls are serialized on an internal lock held
/// for the whole resolution.
pub struct Resolver {
    cfg: LayeringConfig,
    topology: Option<Arc<dyn Topology>>,
    state: Mutex<ResolverState>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("cfg", &self.cfg)
            .field("has_topology", &self.topology.is_some())
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Resolver without topology; every call fails with `NotConfigured` until one is registered.
    pub fn new(cfg: LayeringConfig) -> LayeringResult<Self> {
        cfg.validate()?;
        let ratios = RatioCache::new(cfg.ratio_cache_capacity);
        Ok(Self {
            cfg,
            topology: None,
            state: Mutex::new(ResolverState {
                arena: SweepArena::default(),
                sequence: FrameSeq::default(),
                ratios,
                committed: [None; MAX_PIPES],
                diagnostics: Diagnostics::default(),
            }),
        })
    }

    /// Resolver with topology registered.
    pub fn with_topology(cfg: LayeringConfig, topology: Arc<dyn Topology>) -> LayeringResult<Self> {
        let mut resolver = Self::new(cfg)?;
        resolver.register_topology(topology);
        Ok(resolver)
    }

    /// Install or replace the hardware tables.
    pub fn register_topology(&mut self, topology: Arc<dyn Topology>) {
        self.topology = Some(topology);
    }

    /// Active configuration.
    pub fn config(&self) -> &LayeringConfig {
        &self.cfg
    }

    fn lock(&self) -> LayeringResult<MutexGuard<'_, ResolverState>> {
        self.state
            .lock()
            .map_err(|_| LayeringError::internal("resolver state lock poisoned"))
    }

    fn topology(&self) -> LayeringResult<&dyn Topology> {
        self.topology
            .as_deref()
            .ok_or_else(|| LayeringError::not_configured("no hardware topology registered"))
    }

    /// Resolve a boundary request and write the outputs back into it.
    ///
    /// Nothing is written when the request is rejected.
    #[tracing::instrument(skip(self, req), fields(pipes = req.pipes.len()))]
    pub fn resolve(&self, req: &mut LayeringRequest) -> LayeringResult<FrameDecision> {
        validate_request(req)?;
        let mut frame = normalize_request(req)?;
        let decision = self.resolve_frame(&mut frame)?;
        decision.write_back(req);
        Ok(decision)
    }

    /// Resolve an already-normalized frame in place.
    ///
    /// A frame that breaks [`Frame::check`] is rejected with `InvalidArgument` and left as is.
    pub fn resolve_frame(&self, frame: &mut Frame) -> LayeringResult<FrameDecision> {
        frame.check()?;
        let topo = self.topology()?;
        let mut state = self.lock()?;
        Ok(state.resolve(frame, topo, &self.cfg))
    }

    /// Record the peak compression ratio (per mille) measured for a buffer.
    ///
    /// Used by the bandwidth monitor on later frames where the buffer is unchanged.
    pub fn record_compress_ratio(&self, buffer_id: u64, peak_ratio: u32) -> LayeringResult<()> {
        let mut state = self.lock()?;
        if state.ratios.record(buffer_id, peak_ratio) {
            state.diagnostics.ratio_clamps += 1;
            tracing::warn!(buffer_id, peak_ratio, "compression ratio out of range; clamped");
        }
        Ok(())
    }

    /// Counters accumulated so far.
    pub fn diagnostics(&self) -> LayeringResult<Diagnostics> {
        Ok(self.lock()?.diagnostics)
    }
}

fn ext_enabled(cfg: &LayeringConfig, pipe: PipeId) -> bool {
    cfg.ext_layer && (pipe.is_primary() || cfg.ext_layer_on_secondary)
}

/// Group extended layers and fit the pipe, retrying once after a resize release.
fn group_and_fit(
    pipe: &mut PipeLayers,
    topo: &PipeTopology,
    cfg: &LayeringConfig,
    scenario: &mut ResizeScenario,
    diag: &mut Diagnostics,
) {
    for attempt in 0..2 {
        if ext_enabled(cfg, pipe.pipe) {
            let attached = group_ext_layers(pipe, topo, cfg);
            tracing::debug!(pipe = %pipe.pipe, attached, "extended layers grouped");
        }
        pipe.mark(Stage::Grouped);
        let outcome = fit_to_slots(pipe, topo, scenario, attempt == 0, diag);
        tracing::debug!(
            pipe = %pipe.pipe,
            verdict = ?outcome.verdict,
            phy = outcome.phy_count,
            limit = outcome.limit,
            "capacity checked"
        );
        if outcome.verdict != CapacityVerdict::ResizeReleased {
            break;
        }
    }
}

impl ResolverState {
    fn resolve(
        &mut self,
        frame: &mut Frame,
        topology: &dyn Topology,
        cfg: &LayeringConfig,
    ) -> FrameDecision {
        self.sequence = self.sequence.advance();
        frame.sequence = self.sequence;
        frame.scenario = ResizeScenario::None;
        let diag = &mut self.diagnostics;

        for pipe in &mut frame.pipes {
            if topology.pipe(pipe.pipe).is_none() && !pipe.is_empty() {
                tracing::warn!(pipe = %pipe.pipe, "no overlay hardware configured; pipe composed on GPU");
                pipe.fall_back(ErrorKind::NotConfigured, Stage::Unresolved);
            }
        }

        for pipe in &mut frame.pipes {
            let Some(topo) = topology.pipe(pipe.pipe) else {
                continue;
            };
            let scenario = resize_pipe(pipe, topo, cfg);
            if pipe.pipe.is_primary() {
                frame.scenario = scenario;
                if cfg.inactive_layer_cache {
                    cache_inactive(pipe);
                }
            }
            group_and_fit(pipe, topo, cfg, &mut frame.scenario, diag);
        }

        let bounds = topology.bounds();
        let mut bw = sweep_frame(frame, bounds, cfg, &mut self.arena, &self.ratios);
        if reduce_to_worst_tier(frame, bounds, cfg, &mut bw, diag) {
            for pipe in &mut frame.pipes {
                if let Some(topo) = topology.pipe(pipe.pipe) {
                    fit_to_slots(pipe, topo, &mut frame.scenario, false, diag);
                }
            }
        }

        let mut committed = [None; MAX_PIPES];
        for pipe in &mut frame.pipes {
            let Some(topo) = topology.pipe(pipe.pipe) else {
                pipe.mark(Stage::Dispatched);
                continue;
            };
            if cfg.clear_layer {
                promote_clear_layer(pipe, topo);
            }
            let idx = pipe.pipe.index();
            committed[idx] = dispatch_pipe(pipe, topo, self.committed[idx], diag);
        }
        self.committed = committed;
        diag.frames += 1;

        tracing::debug!(
            sequence = frame.sequence.0,
            level = bw.level,
            weight = bw.weight,
            "frame resolved"
        );
        FrameDecision::from_frame(frame, bw.level, bw.weight, bw.monitor_weight)
    }
}
