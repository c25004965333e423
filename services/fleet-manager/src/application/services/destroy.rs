//! Application service: stage VM destroy use-case.
//!
//! One attempt resolves the stage's owner and instance, runs best-effort
//! in-guest cleanup, terminates the instance and retires the stage's
//! bookkeeping. [`DestroyService::handle_destroy`] repeats attempts under an
//! exponential backoff because a destroy can arrive while the provisioning
//! request for the same stage is still registering its owner or instance.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fleet_common::{EnvConfig, ExecutionStats, GuestDestroyRequest, Instance, VmCleanupRequest};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing::field::Empty;

use crate::application::backoff::{
    DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_INTERVAL, ExponentialBackoff,
};
use crate::application::ports::{
    AgentClientFactory, MetricsSink, PoolManager, StageOwnerStore, UsageLabels,
};
use crate::application::stage_state::StageStateRegistry;
use crate::domain::guest_os::lite_engine_log_path;
use crate::domain::{BestEffort, DestroyError, classify_usage, validate_cleanup_request};

const API_NAME: &str = "dlite:destroy";

/// Tunables for the destroy workflow.
#[derive(Debug, Clone)]
pub struct DestroySettings {
    pub runner_name: String,
    pub lite_engine_mock: bool,
    pub lite_engine_mock_timeout_secs: u64,
    /// Total retry budget for one destroy request.
    pub max_elapsed: Duration,
    /// Bound on the detached in-guest cleanup call.
    pub guest_cleanup_timeout: Duration,
    pub backoff_initial_interval: Duration,
    pub backoff_max_interval: Duration,
}

impl Default for DestroySettings {
    fn default() -> Self {
        Self::from_config(&EnvConfig::default())
    }
}

impl DestroySettings {
    #[must_use]
    pub fn from_config(cfg: &EnvConfig) -> Self {
        Self {
            runner_name: cfg.runner_name.clone(),
            lite_engine_mock: cfg.lite_engine_enable_mock,
            lite_engine_mock_timeout_secs: cfg.lite_engine_mock_step_timeout_secs,
            max_elapsed: Duration::from_secs(cfg.destroy_max_elapsed_secs),
            guest_cleanup_timeout: Duration::from_secs(cfg.guest_cleanup_timeout_secs),
            backoff_initial_interval: DEFAULT_INITIAL_INTERVAL,
            backoff_max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

/// Decommissions the VM bound to a stage.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct DestroyService {
    owners: Arc<dyn StageOwnerStore>,
    pool: Arc<dyn PoolManager>,
    agents: Arc<dyn AgentClientFactory>,
    metrics: Arc<dyn MetricsSink>,
    stages: Arc<StageStateRegistry>,
    settings: DestroySettings,
}

impl DestroyService {
    #[must_use]
    pub fn new(
        owners: Arc<dyn StageOwnerStore>,
        pool: Arc<dyn PoolManager>,
        agents: Arc<dyn AgentClientFactory>,
        metrics: Arc<dyn MetricsSink>,
        stages: Arc<StageStateRegistry>,
        settings: DestroySettings,
    ) -> Self {
        Self {
            owners,
            pool,
            agents,
            metrics,
            stages,
            settings,
        }
    }

    /// Destroy the VM bound to `req.stage_runtime_id`, retrying until success
    /// or until the retry budget is spent.
    ///
    /// `cancel` is checked before every attempt and interrupts the wait
    /// between attempts; an attempt already in flight always runs to
    /// completion.
    ///
    /// # Errors
    ///
    /// - `DestroyError::BadRequest` when the stage id is missing; nothing else
    ///   is touched.
    /// - The error of the last attempt once the backoff budget is exhausted.
    /// - `DestroyError::Cancelled` when `cancel` has fired, wrapping the last
    ///   attempt error if any attempt ran. A token cancelled before the call
    ///   prevents every attempt, termination included.
    pub async fn handle_destroy(
        &self,
        req: &VmCleanupRequest,
        cancel: &CancellationToken,
    ) -> Result<()> {
        validate_cleanup_request(req)?;

        let mut backoff = self.backoff();
        let mut retries: u32 = 0;
        let mut last_err: Option<anyhow::Error> = None;
        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(req, retries, last_err));
            }
            let wait = backoff.next_backoff();
            let err = match self.destroy_once(req, retries).await {
                Ok(_) => return Ok(()),
                Err(err) => err,
            };
            tracing::error!(
                error = %format!("{err:#}"),
                retry_count = retries,
                stage_runtime_id = %req.stage_runtime_id,
                "could not destroy VM",
            );
            let Some(wait) = wait else {
                return Err(err);
            };
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = cancel.cancelled() => {
                    return Err(cancelled(req, retries, Some(err)));
                }
            }
            last_err = Some(err);
            retries += 1;
        }
    }

    /// Run a single destroy attempt and return the terminated instance.
    ///
    /// # Errors
    ///
    /// Fails when the owner or the instance cannot be resolved, or when
    /// termination fails. In-guest cleanup and owner-record deletion
    /// failures are logged only.
    pub async fn destroy_once(&self, req: &VmCleanupRequest, retry_count: u32) -> Result<Instance> {
        let ctx = &req.context;
        let span = tracing::info_span!(
            "destroy",
            stage_runtime_id = %req.stage_runtime_id,
            pool = Empty,
            api = API_NAME,
            retry_count,
            account_id = ctx.account_id.as_deref(),
            org_id = ctx.org_id.as_deref(),
            project_id = ctx.project_id.as_deref(),
            pipeline_id = ctx.pipeline_id.as_deref(),
            run_sequence = ctx.run_sequence.as_deref(),
            task_id = ctx.task_id.as_deref(),
            instance_id = Empty,
            instance_name = Empty,
        );
        self.attempt(req, &span).instrument(span.clone()).await
    }

    async fn attempt(&self, req: &VmCleanupRequest, span: &tracing::Span) -> Result<Instance> {
        let stage_id = req.stage_runtime_id.as_str();

        let owner = self
            .owners
            .find(stage_id)
            .await
            .with_context(|| format!("failed to find stage owner entity for stage: {stage_id}"))?
            .ok_or_else(|| DestroyError::OwnerNotFound(stage_id.to_string()))?;
        let pool = owner.pool_name;
        span.record("pool", pool.as_str());
        tracing::trace!("starting the destroy process");

        let inst = self
            .pool
            .instance_by_stage_id(&pool, stage_id)
            .await
            .context("cannot get the instance by tag")?
            .ok_or_else(|| DestroyError::InstanceNotFound(stage_id.to_string()))?;
        span.record("instance_id", inst.id.as_str());
        span.record("instance_name", inst.name.as_str());

        tracing::trace!("invoking lite engine cleanup");
        let stats = self
            .guest_cleanup(&inst, req.log_key.clone())
            .await
            .or_log(|e| tracing::error!(error = %format!("{e:#}"), "lite engine cleanup skipped"))
            .flatten();
        if let Some(stats) = stats {
            self.record_usage(&pool, &inst, &stats);
        }

        tracing::trace!("destroying instance");
        self.pool
            .destroy(&pool, &inst.id)
            .await
            .context("cannot destroy the instance")?;
        tracing::trace!("destroyed instance");

        self.stages.delete(stage_id);
        BestEffort::from_result(self.owners.delete(stage_id).await).or_log(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to delete stage owner entity");
        });

        Ok(inst)
    }

    /// Ask the in-guest agent to clean up.
    ///
    /// The call runs on its own task, so dropping the caller's future does not
    /// abort it; `guest_cleanup_timeout` bounds it instead.
    async fn guest_cleanup(
        &self,
        inst: &Instance,
        log_key: Option<String>,
    ) -> BestEffort<Option<ExecutionStats>> {
        let client = match self.agents.client(
            inst,
            &self.settings.runner_name,
            inst.port,
            self.settings.lite_engine_mock,
            self.settings.lite_engine_mock_timeout_secs,
        ) {
            Ok(client) => client,
            Err(e) => {
                return BestEffort::Failed(
                    e.context("could not create lite engine client for invoking cleanup"),
                );
            }
        };

        let req = GuestDestroyRequest {
            log_drone: false,
            log_key,
            lite_engine_path: lite_engine_log_path(&inst.os).to_string(),
        };
        let timeout = self.settings.guest_cleanup_timeout;
        let cleanup = async move { tokio::time::timeout(timeout, client.destroy(req)).await };
        let task = tokio::spawn(cleanup.in_current_span());

        let result = match task.await {
            Ok(Ok(resp)) => resp.context("could not invoke lite engine cleanup"),
            Ok(Err(_)) => Err(anyhow::anyhow!(
                "lite engine cleanup timed out after {}ms",
                timeout.as_millis()
            )),
            Err(e) => Err(anyhow::Error::new(e).context("lite engine cleanup task failed")),
        };
        BestEffort::from_result(result.map(|resp| resp.os_stats))
    }

    fn record_usage(&self, pool: &str, inst: &Instance, stats: &ExecutionStats) {
        let cpu = classify_usage(stats.max_cpu_usage_pct);
        let mem = classify_usage(stats.max_mem_usage_pct);

        let labels = UsageLabels {
            pool_id: pool,
            os: &inst.os,
            arch: &inst.arch,
            provider: inst.provider.as_str(),
        };
        self.metrics
            .observe_cpu_percentile(labels, stats.max_cpu_usage_pct);
        self.metrics
            .observe_memory_percentile(labels, stats.max_mem_usage_pct);

        tracing::trace!(
            cpu_ge50 = cpu.ge50,
            cpu_ge70 = cpu.ge70,
            cpu_ge90 = cpu.ge90,
            mem_ge50 = mem.ge50,
            mem_ge70 = mem.ge70,
            mem_ge90 = mem.ge90,
            total_mem_mb = stats.total_mem_mb,
            cpu_cores = stats.cpu_cores,
            avg_mem_usage_pct = stats.avg_mem_usage_pct,
            avg_cpu_usage_pct = stats.avg_cpu_usage_pct,
            max_mem_usage_pct = stats.max_mem_usage_pct,
            max_cpu_usage_pct = stats.max_cpu_usage_pct,
            "execution stats",
        );
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.settings.max_elapsed)
            .with_initial_interval(self.settings.backoff_initial_interval)
            .with_max_interval(self.settings.backoff_max_interval)
    }
}

fn cancelled(
    req: &VmCleanupRequest,
    retries: u32,
    last_err: Option<anyhow::Error>,
) -> anyhow::Error {
    let reason = DestroyError::Cancelled {
        stage_runtime_id: req.stage_runtime_id.clone(),
        retries,
    };
    match last_err {
        Some(err) => err.context(reason),
        None => reason.into(),
    }
}
