use crate::boundary::{expand_boundary, resolve_boundary};
use crate::empty_area::empty_area;
use crate::error::{ClearError, ClearResult};
use crate::geometry::ids::ToolId;
use crate::geometry::{swept_area, union_all};
use crate::isolation::isolation_envelope;
use crate::planner::{plan_tool_order, validate_tools};
use crate::rest::{clear_polygon_set, clear_rest};
use crate::types::{
    ClearPath, JobConfig, JobOutcome, JobProgress, JobStatus, JobWarnings, ProgressFn, Tool,
    ToolRole,
};
use geo::MultiPolygon;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// One copper-clearing run: a tool pool, a config, a cancellation flag and an
/// optional progress callback. Built per run and discarded after the outcome
/// is consumed.
pub struct ClearJob {
    config: JobConfig,
    tools: Vec<Tool>,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressFn>,
}

impl ClearJob {
    pub fn new(config: JobConfig, tools: Vec<Tool>) -> Self {
        Self {
            config,
            tools,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Shared handle for aborting the run from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Clear all copper inside the configured bounding region.
    ///
    /// Single-pass mode runs every tool independently against the same
    /// area-to-clear; rest-machining mode hands each tool only what larger
    /// tools left behind. Fails with `NoResultGeometry` when every tool ends
    /// empty; per-polygon failures and broken isolation demote the status to
    /// `DoneWithWarnings` instead.
    pub fn run(&self, copper: &MultiPolygon<f64>) -> ClearResult<JobOutcome> {
        if self.config.check_tool_validity {
            validate_tools(&self.tools)?;
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Err(ClearError::Cancelled);
        }

        let planned = plan_tool_order(&self.tools, self.config.order, self.config.rest_machining);
        let boundary = resolve_boundary(&self.config.selection, copper)?;
        let boundary = expand_boundary(&boundary, self.config.margin, &self.config.selection);

        let mut warnings = JobWarnings::default();
        for tool in &planned {
            if matches!(tool.role, ToolRole::Isolation) && tool.diameter > self.config.margin {
                warn!(
                    tool = %tool.name,
                    diameter = tool.diameter,
                    margin = self.config.margin,
                    "isolation tool is wider than the job margin"
                );
                warnings.broken_isolation += 1;
            }
        }

        let tool_paths = if self.config.rest_machining {
            clear_rest(
                &planned,
                &boundary,
                copper,
                &self.cancel,
                self.progress.as_ref(),
                &mut warnings,
            )?
        } else {
            self.clear_single_pass(&planned, &boundary, copper, &mut warnings)?
        };

        if tool_paths.is_empty() {
            return Err(ClearError::NoResultGeometry);
        }

        let mut sweeps = Vec::with_capacity(tool_paths.len());
        for tool in &planned {
            if let Some(paths) = tool_paths.get(&tool.id) {
                sweeps.push(swept_area(paths, tool.diameter));
            }
        }
        let cleared_union = union_all(sweeps);

        let status = if warnings.is_clean() {
            JobStatus::Done
        } else {
            JobStatus::DoneWithWarnings
        };
        Ok(JobOutcome {
            tool_paths,
            cleared_union,
            warnings,
            status,
        })
    }

    /// Every tool gets the full area-to-clear; only a stand-off offset makes
    /// a tool recompute its own subtraction.
    fn clear_single_pass(
        &self,
        planned: &[Tool],
        boundary: &MultiPolygon<f64>,
        copper: &MultiPolygon<f64>,
        warnings: &mut JobWarnings,
    ) -> ClearResult<BTreeMap<ToolId, Vec<ClearPath>>> {
        let base = empty_area(boundary, copper, None)?;
        let mut tool_paths = BTreeMap::new();

        for (index, tool) in planned.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(ClearError::Cancelled);
            }

            let mut examined = 0;
            let mut done = 0;
            let paths = if matches!(tool.role, ToolRole::Isolation) {
                match isolation_envelope(copper, tool.radius(), tool.direction) {
                    Ok(envelope) => envelope.rings,
                    Err(err) => {
                        warn!(tool = %tool.name, %err, "isolation envelope failed");
                        continue;
                    }
                }
            } else {
                let area = match tool.offset {
                    Some(stand_off) => match empty_area(boundary, copper, Some(stand_off)) {
                        Ok(area) => area,
                        Err(err) => {
                            warn!(tool = %tool.name, %err, "stand-off left nothing to clear");
                            continue;
                        }
                    },
                    None => base.clone(),
                };
                examined = area.0.len();
                let failures_before = warnings.failed_polygons.len();
                let paths =
                    clear_polygon_set(&area.0, tool, &self.cancel, &mut warnings.failed_polygons)?;
                done = examined - (warnings.failed_polygons.len() - failures_before);
                paths
            };

            if let Some(callback) = &self.progress {
                callback(JobProgress {
                    tool_index: index,
                    tool_count: planned.len(),
                    polygons_done: done,
                    polygon_count: examined,
                });
            }

            if paths.is_empty() {
                debug!(tool = %tool.name, "tool produced no paths");
                continue;
            }
            debug!(tool = %tool.name, paths = paths.len(), "tool pass complete");
            tool_paths.insert(tool.id, paths);
        }

        Ok(tool_paths)
    }
}
