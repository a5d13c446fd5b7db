//! Context lifecycle
//!
//! Every engine call that allocates needs a general context, and compile or
//! match calls usually take a compile or match context too. For each kind
//! the host either passes a handle, which is used as-is and never freed
//! here, or a sentinel:
//!
//! - general: the bridge's default context, created once on first demand
//!   with the host allocator hooks and kept for the life of the bridge
//! - compile, match: a fresh context bound to the default general context,
//!   owned by a `ScopedContext` and freed when the guard drops, on every
//!   exit path of the operation

use crate::engine::{CompileContextPtr, GeneralContextPtr, MatchContextPtr, RegexEngine};
use crate::handle::{Handle, HandleError, HandleTable, Resource, ResourceKind};
use crate::host::{HostMemory, MemoryError};
use std::ops::Deref;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The engine returned null from a create call
    #[error("could not create a {0}")]
    Unavailable(ResourceKind),
}

/// Where a context used for one call came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// A host handle; the host frees it
    Supplied,
    /// The bridge default; never freed
    DefaultSingleton,
    /// Created for this call; freed when the guard drops
    Ephemeral,
}

/// A context type the engine can free
pub trait EngineContext: Copy + std::fmt::Debug {
    const KIND: ResourceKind;

    fn free_with<E: RegexEngine + ?Sized>(self, engine: &E);
}

impl EngineContext for GeneralContextPtr {
    const KIND: ResourceKind = ResourceKind::GeneralContext;

    fn free_with<E: RegexEngine + ?Sized>(self, engine: &E) {
        engine.general_context_free(self)
    }
}

impl EngineContext for CompileContextPtr {
    const KIND: ResourceKind = ResourceKind::CompileContext;

    fn free_with<E: RegexEngine + ?Sized>(self, engine: &E) {
        engine.compile_context_free(self)
    }
}

impl EngineContext for MatchContextPtr {
    const KIND: ResourceKind = ResourceKind::MatchContext;

    fn free_with<E: RegexEngine + ?Sized>(self, engine: &E) {
        engine.match_context_free(self)
    }
}

/// A context borrowed for one call
///
/// Dereferences to the context pointer. Ephemeral contexts are freed exactly
/// once, when the guard drops.
pub struct ScopedContext<'e, E: RegexEngine + ?Sized, C: EngineContext> {
    engine: &'e E,
    context: C,
    source: ContextSource,
}

impl<'e, E: RegexEngine + ?Sized, C: EngineContext> ScopedContext<'e, E, C> {
    pub fn supplied(engine: &'e E, context: C) -> Self {
        Self {
            engine,
            context,
            source: ContextSource::Supplied,
        }
    }

    pub fn ephemeral(engine: &'e E, context: C) -> Self {
        log::trace!("ephemeral {} created", C::KIND);
        Self {
            engine,
            context,
            source: ContextSource::Ephemeral,
        }
    }

    pub fn get(&self) -> C {
        self.context
    }

    pub fn source(&self) -> ContextSource {
        self.source
    }
}

impl<E: RegexEngine + ?Sized, C: EngineContext> Deref for ScopedContext<'_, E, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.context
    }
}

impl<E: RegexEngine + ?Sized, C: EngineContext> Drop for ScopedContext<'_, E, C> {
    fn drop(&mut self) {
        if self.source == ContextSource::Ephemeral {
            log::trace!("ephemeral {} freed", C::KIND);
            self.context.free_with(self.engine);
        }
    }
}

/// The default general context and the per-call context rules
#[derive(Debug, Default)]
pub struct ContextManager {
    default: Option<GeneralContextPtr>,
    default_handle: Option<Handle>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default general context, if it has been created
    pub fn default_context(&self) -> Option<GeneralContextPtr> {
        self.default
    }

    /// Create the default general context on first demand
    pub fn default_general<E: RegexEngine + ?Sized>(
        &mut self,
        engine: &E,
        memory: &dyn HostMemory,
    ) -> Result<GeneralContextPtr, ContextError> {
        if let Some(context) = self.default {
            return Ok(context);
        }

        let hooks = memory.engine_hooks()?;
        let context = engine
            .general_context_create(hooks)
            .ok_or(ContextError::Unavailable(ResourceKind::GeneralContext))?;
        log::debug!("default general context created at {:#x}", context.addr());
        self.default = Some(context);
        Ok(context)
    }

    /// Handle of the default general context
    ///
    /// Registered on first request as a pinned entry so the host can pass it
    /// around but never free it.
    pub fn default_handle<E: RegexEngine + ?Sized>(
        &mut self,
        engine: &E,
        memory: &dyn HostMemory,
        handles: &mut HandleTable,
    ) -> Result<Handle, ContextError> {
        if let Some(handle) = self.default_handle {
            return Ok(handle);
        }
        let context = self.default_general(engine, memory)?;
        let handle = handles.insert_pinned(Resource::GeneralContext(context));
        self.default_handle = Some(handle);
        Ok(handle)
    }

    /// A general context for one call: the supplied one or the default
    pub fn general<E: RegexEngine + ?Sized>(
        &mut self,
        engine: &E,
        memory: &dyn HostMemory,
        handles: &HandleTable,
        token: &str,
    ) -> Result<GeneralContextPtr, ContextError> {
        match handles.get_as::<GeneralContextPtr>(token)? {
            Some(context) => Ok(context),
            None => self.default_general(engine, memory),
        }
    }

    /// A compile context for one call
    pub fn compile<'e, E: RegexEngine + ?Sized>(
        &mut self,
        engine: &'e E,
        memory: &dyn HostMemory,
        handles: &HandleTable,
        token: &str,
    ) -> Result<ScopedContext<'e, E, CompileContextPtr>, ContextError> {
        if let Some(context) = handles.get_as::<CompileContextPtr>(token)? {
            return Ok(ScopedContext::supplied(engine, context));
        }
        let general = self.default_general(engine, memory)?;
        let context = engine
            .compile_context_create(Some(general))
            .ok_or(ContextError::Unavailable(ResourceKind::CompileContext))?;
        Ok(ScopedContext::ephemeral(engine, context))
    }

    /// A match context for one call
    pub fn matching<'e, E: RegexEngine + ?Sized>(
        &mut self,
        engine: &'e E,
        memory: &dyn HostMemory,
        handles: &HandleTable,
        token: &str,
    ) -> Result<ScopedContext<'e, E, MatchContextPtr>, ContextError> {
        if let Some(context) = handles.get_as::<MatchContextPtr>(token)? {
            return Ok(ScopedContext::supplied(engine, context));
        }
        let general = self.default_general(engine, memory)?;
        let context = engine
            .match_context_create(Some(general))
            .ok_or(ContextError::Unavailable(ResourceKind::MatchContext))?;
        Ok(ScopedContext::ephemeral(engine, context))
    }
}
