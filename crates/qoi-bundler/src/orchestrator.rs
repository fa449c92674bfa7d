//! Build orchestration.
//!
//! One [`Orchestrator::run`] loads the manifest and config once, filters the
//! targets by name, applies the clean policy and then builds every selected
//! target concurrently. Failures never short-circuit sibling work: every
//! error from every target is collected and returned together.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::{IndexMap, IndexSet};
use qoi_config::{
    ConfigResolver, EnvOverlay, PackageJson, ProjectContext, TargetConfig, load_env,
};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::build::{self, BuildOutput};
use crate::dts::{self, DeclarationOutput};
use crate::engine::BundleEngine;
use crate::hooks::{Target, TargetHooks};
use crate::manifest;
use crate::options::BuildOptions;
use crate::output::writer::clean_dir;
use crate::plan::BuildPlan;
use crate::post_build;
use crate::tasks::TaskGroup;
use crate::{Error, Result};

/// What one target produced.
#[derive(Debug, Clone, Default)]
pub struct TargetReport {
    pub name: String,
    pub code: Vec<BuildOutput>,
    pub declarations: Option<DeclarationOutput>,
    pub manifest: Option<PathBuf>,
    pub readme: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub targets: Vec<TargetReport>,
}

pub struct Orchestrator {
    ctx: ProjectContext,
    options: BuildOptions,
    engine: Arc<dyn BundleEngine>,
    resolver: Option<ConfigResolver>,
    targets: Option<Vec<Target>>,
    hooks: IndexMap<String, Arc<dyn TargetHooks>>,
    env: Option<EnvOverlay>,
}

impl Orchestrator {
    pub fn new(ctx: ProjectContext, options: BuildOptions, engine: Arc<dyn BundleEngine>) -> Self {
        Self {
            ctx,
            options,
            engine,
            resolver: None,
            targets: None,
            hooks: IndexMap::new(),
            env: None,
        }
    }

    /// Use a preconfigured resolver (e.g. one with registered providers).
    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Skip config discovery and build exactly these targets.
    pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Attach hooks to the target labelled `name` (`default` for an unnamed
    /// target).
    pub fn with_hooks(mut self, name: impl Into<String>, hooks: Arc<dyn TargetHooks>) -> Self {
        self.hooks.insert(name.into(), hooks);
        self
    }

    /// Use this overlay instead of reading `--env`. Without either the build
    /// environment is empty.
    pub fn with_env(mut self, env: EnvOverlay) -> Self {
        self.env = Some(env);
        self
    }

    pub fn context(&self) -> &ProjectContext {
        &self.ctx
    }

    fn load_targets(&self) -> Result<Vec<Target>> {
        let mut targets = match &self.targets {
            Some(targets) => targets.clone(),
            None => {
                let default_resolver;
                let resolver = match &self.resolver {
                    Some(resolver) => resolver,
                    None => {
                        default_resolver = ConfigResolver::new(self.ctx.clone());
                        &default_resolver
                    }
                };
                resolver
                    .resolve(self.options.config.as_deref())?
                    .into_targets()
                    .into_iter()
                    .map(Target::from)
                    .collect()
            }
        };

        for target in &mut targets {
            if target.hooks.is_none() {
                target.hooks = self.hooks.get(target.label()).cloned();
            }
        }
        Ok(targets)
    }

    /// The directory a per-target clean removes: the target `outDir`, else
    /// its output overlay `dir`, else the global out dir.
    fn target_out_dir(&self, config: &TargetConfig) -> PathBuf {
        let dir = config
            .out_dir
            .as_deref()
            .or_else(|| config.output.as_ref().and_then(|o| o.dir.as_deref()))
            .unwrap_or(&self.options.out_dir);
        self.ctx.resolve(dir)
    }

    pub async fn run(&self) -> Result<BuildReport> {
        let pkg = Arc::new(PackageJson::load(&self.ctx)?);
        let names = self.options.names();
        let filtered = !names.is_empty();

        let targets: Vec<Target> = self
            .load_targets()?
            .into_iter()
            .filter(|target| target.config.is_selected_by(&names))
            .collect();
        if filtered && targets.is_empty() {
            warn!(names = ?names, "no target matches the name filter");
        }

        if self.options.clean_out_dir {
            if filtered {
                // All selected targets are cleaned before any of them writes.
                let dirs: IndexSet<PathBuf> = targets
                    .iter()
                    .map(|target| self.target_out_dir(&target.config))
                    .collect();
                for dir in &dirs {
                    clean_dir(dir)?;
                }
            } else {
                clean_dir(&self.ctx.resolve(&self.options.out_dir))?;
            }
        }

        let base_env = match &self.env {
            Some(env) => env.clone(),
            None => load_env(self.options.env.as_deref(), &self.ctx)?,
        };

        let results = join_all(targets.iter().map(|target| {
            let span = info_span!("target", name = %target.label());
            self.run_target(target, &pkg, &base_env).instrument(span)
        }))
        .await;

        let mut report = BuildReport::default();
        let mut errors = Vec::new();
        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(target_report) => report.targets.push(target_report),
                Err(err) => errors.push(err.for_target(target.label())),
            }
        }
        Error::aggregate(errors)?;
        Ok(report)
    }

    async fn run_target(
        &self,
        target: &Target,
        pkg: &PackageJson,
        base_env: &EnvOverlay,
    ) -> Result<TargetReport> {
        let config = &target.config;
        info!("building target");

        let env = base_env.layered(&config.env);
        debug!(vars = env.len(), "environment overlay ready");

        let plan = BuildPlan::new(&self.ctx, &self.options, pkg, target, env)?;
        let engine = self.engine.as_ref();
        let options = &self.options;
        let hooks = target.hooks.as_deref();

        let mut report = TargetReport {
            name: target.label().to_string(),
            ..Default::default()
        };

        {
            let mut group = TaskGroup::new();
            if dts::code_build_requested(options, config) {
                let code = &mut report.code;
                let plan = &plan;
                group.spawn("code", async move {
                    *code = build::build(engine, plan, options.write).await?;
                    Ok(())
                });
            }
            if dts::declarations_requested(options, config) {
                let declarations = &mut report.declarations;
                let (ctx, plan) = (&self.ctx, &plan);
                group.spawn("declarations", async move {
                    let output = dts::build_declarations(
                        engine,
                        ctx,
                        options,
                        config,
                        plan,
                        pkg.short_name(),
                    )
                    .await?;
                    *declarations = Some(output);
                    Ok(())
                });
            }
            let readme = &mut report.readme;
            let (root, out_dir) = (self.ctx.root(), plan.out_dir.as_path());
            group.spawn("readme", async move {
                *readme = manifest::copy_readme(root, out_dir).await?;
                Ok(())
            });
            let manifest_path = &mut report.manifest;
            group.spawn("manifest", async move {
                let path = manifest::copy_package(
                    pkg,
                    out_dir,
                    options.legacy(),
                    config.package_json.as_ref(),
                    hooks,
                )
                .await?;
                *manifest_path = Some(path);
                Ok(())
            });
            group.join().await?;
        }

        post_build::run_steps(&self.ctx, &config.build_end).await?;
        if let Some(hooks) = hooks {
            hooks
                .build_end()
                .await
                .map_err(|err| match err {
                    Error::Hook(_) => err,
                    other => Error::Hook(other.to_string()),
                })?;
        }

        info!("target finished");
        Ok(report)
    }
}
