use schemadump_core::{DatabaseSchema, DumpConfig, DumpPlan, check_order, plan_dump};

use crate::document::DumpDocument;
use crate::errors::Result;
use crate::middleware::{DumpHeader, IgnoreTables, InferReferences};
use crate::{Renderer, renderer_for};

/// Shared state threaded through every middleware phase of a dump.
#[derive(Debug, Clone)]
pub struct DumpEnv {
    pub config: DumpConfig,
    pub schema: DatabaseSchema,
    /// Set once planning has run.
    pub plan: Option<DumpPlan>,
    /// Set once rendering has run.
    pub document: Option<DumpDocument>,
}

/// Extension hooked into the phases of a dump.
///
/// Every phase defaults to a no-op so implementations only override what they need.
pub trait DumpMiddleware: Send + Sync {
    /// Unique name used by [`Pipeline::replace`] and [`Pipeline::remove`].
    fn name(&self) -> &str;

    fn before_plan(&self, _env: &mut DumpEnv) -> Result<()> {
        Ok(())
    }

    fn after_plan(&self, _env: &mut DumpEnv) -> Result<()> {
        Ok(())
    }

    fn after_render(&self, _env: &mut DumpEnv) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    BeforePlan,
    AfterPlan,
    AfterRender,
}

/// Ordered middleware chain around planning and rendering.
pub struct Pipeline {
    config: DumpConfig,
    renderer: Box<dyn Renderer>,
    middlewares: Vec<Box<dyn DumpMiddleware>>,
}

impl Pipeline {
    /// Empty pipeline rendering in the configured format.
    pub fn new(config: DumpConfig) -> Self {
        let renderer = renderer_for(config.format);
        Self {
            config,
            renderer,
            middlewares: Vec::new(),
        }
    }

    /// Pipeline with the built-in middlewares registered.
    pub fn with_defaults(config: DumpConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline
            .register(IgnoreTables)
            .register(InferReferences)
            .register(DumpHeader);
        pipeline
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Append a middleware; it runs after every middleware registered before it.
    pub fn register(&mut self, middleware: impl DumpMiddleware + 'static) -> &mut Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Swap the middleware called `name` in place. Returns false if none matched.
    pub fn replace(&mut self, name: &str, middleware: impl DumpMiddleware + 'static) -> bool {
        match self.middlewares.iter().position(|item| item.name() == name) {
            Some(index) => {
                self.middlewares[index] = Box::new(middleware);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.middlewares.len();
        self.middlewares.retain(|item| item.name() != name);
        self.middlewares.len() != before
    }

    pub fn names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|item| item.name()).collect()
    }

    /// Run every phase over `schema` and return the final environment.
    pub fn run(&self, schema: DatabaseSchema) -> Result<DumpEnv> {
        check_order(self.renderer.format(), self.config.order)?;

        let mut env = DumpEnv {
            config: self.config.clone(),
            schema,
            plan: None,
            document: None,
        };

        self.run_phase(Phase::BeforePlan, &mut env)?;

        let plan = plan_dump(&env.schema, &env.config)?;
        tracing::info!(
            event = "plan_built",
            tables = plan.tables.len(),
            inline = plan.inline_count(),
            deferred = plan.deferred_count()
        );
        env.plan = Some(plan);

        self.run_phase(Phase::AfterPlan, &mut env)?;

        let document = match &env.plan {
            Some(plan) => self.renderer.render(&env.schema, plan)?,
            None => DumpDocument::default(),
        };
        env.document = Some(document);

        self.run_phase(Phase::AfterRender, &mut env)?;

        Ok(env)
    }

    fn run_phase(&self, phase: Phase, env: &mut DumpEnv) -> Result<()> {
        for middleware in &self.middlewares {
            let outcome = match phase {
                Phase::BeforePlan => middleware.before_plan(env),
                Phase::AfterPlan => middleware.after_plan(env),
                Phase::AfterRender => middleware.after_render(env),
            };

            if let Err(err) = outcome {
                tracing::error!(
                    event = "middleware_failed",
                    middleware = %middleware.name(),
                    phase = ?phase,
                    error = %err
                );
                return Err(err);
            }
        }
        Ok(())
    }
}
