use super::Bridge;
use crate::engine::types::{callback_from_addr, PrivateFreeFn, PrivateMallocFn};
use crate::engine::{
    AllocatorHooks, CalloutFn, CompileContextPtr, GeneralContextPtr, MatchContextPtr,
    RecursionGuardFn, RegexEngine,
};
use crate::error::BridgeResult;
use crate::handle::{codec, Resource, ResourceKind};
use crate::options::{self, BSR, EXTRA_COMPILE, NEWLINE};
use std::ffi::{c_int, c_void};
use std::ptr::{null, null_mut};

/// Host-supplied user data pointer; sentinels are null
pub(super) fn user_data(token: &str) -> BridgeResult<*mut c_void> {
    Ok(codec::decode_address(token)?.map_or(null_mut(), |addr| addr as *mut c_void))
}

impl<E: RegexEngine> Bridge<E> {
    /// Token of the default general context
    pub fn get_general_context(&mut self) -> BridgeResult<String> {
        let handle = self
            .contexts
            .default_handle(&self.engine, &*self.memory, &mut self.handles)?;
        Ok(handle.token())
    }

    /// A general context with host-supplied allocator functions
    ///
    /// Sentinel function addresses select the engine's own allocator.
    pub fn general_context_create(
        &mut self,
        malloc: &str,
        free: &str,
        data: &str,
    ) -> BridgeResult<String> {
        let malloc = codec::decode_address(malloc)?;
        let free = codec::decode_address(free)?;
        // Safety: the host passes addresses of functions with the engine's
        // allocator hook signatures
        let hooks = unsafe {
            AllocatorHooks {
                malloc: callback_from_addr::<PrivateMallocFn>(malloc),
                free: callback_from_addr::<PrivateFreeFn>(free),
                data: user_data(data)?,
            }
        };
        let context = self.engine.general_context_create(hooks);
        self.register(
            context.map(Resource::GeneralContext),
            ResourceKind::GeneralContext,
        )
    }

    pub fn general_context_copy(&mut self, gcontext: &str) -> BridgeResult<String> {
        let source = self.general(gcontext)?;
        let copy = self.engine.general_context_copy(source);
        self.register(copy.map(Resource::GeneralContext), ResourceKind::GeneralContext)
    }

    pub fn general_context_free(&mut self, gcontext: &str) -> BridgeResult<()> {
        if let Some(context) = self.release::<GeneralContextPtr>(gcontext)? {
            self.engine.general_context_free(context);
        }
        Ok(())
    }

    pub fn compile_context_create(&mut self, gcontext: &str) -> BridgeResult<String> {
        let general = self.general(gcontext)?;
        let context = self.engine.compile_context_create(Some(general));
        self.register(
            context.map(Resource::CompileContext),
            ResourceKind::CompileContext,
        )
    }

    pub fn compile_context_copy(&mut self, ccontext: &str) -> BridgeResult<String> {
        let source = self.handles.require::<CompileContextPtr>(ccontext)?;
        let copy = self.engine.compile_context_copy(source);
        self.register(copy.map(Resource::CompileContext), ResourceKind::CompileContext)
    }

    pub fn compile_context_free(&mut self, ccontext: &str) -> BridgeResult<()> {
        if let Some(context) = self.release::<CompileContextPtr>(ccontext)? {
            self.engine.compile_context_free(context);
        }
        Ok(())
    }

    pub fn set_bsr(&mut self, ccontext: &str, value: &str) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        let value = options::parse(&BSR, value, &*self.memory)?;
        Ok(self.engine.set_bsr(context, value))
    }

    /// Sentinel tables restore the built-in ones
    pub fn set_character_tables(&mut self, ccontext: &str, tables: &str) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        let tables = match self.handles.resolve_kind(tables, ResourceKind::Tables)? {
            Some((_, resource)) => resource
                .bytes()
                .map_or(null(), |bytes| bytes.ptr.as_ptr() as *const u8),
            None => null(),
        };
        Ok(self.engine.set_character_tables(context, tables))
    }

    pub fn set_compile_extra_options(&mut self, ccontext: &str, extra: &str) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        let extra = options::parse(&EXTRA_COMPILE, extra, &*self.memory)?;
        Ok(self.engine.set_compile_extra_options(context, extra))
    }

    pub fn set_max_pattern_length(&mut self, ccontext: &str, length: usize) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        Ok(self.engine.set_max_pattern_length(context, length))
    }

    pub fn set_newline(&mut self, ccontext: &str, value: &str) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        let value = options::parse(&NEWLINE, value, &*self.memory)?;
        Ok(self.engine.set_newline(context, value))
    }

    pub fn set_parens_nest_limit(&mut self, ccontext: &str, limit: u32) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        Ok(self.engine.set_parens_nest_limit(context, limit))
    }

    pub fn set_compile_recursion_guard(
        &mut self,
        ccontext: &str,
        guard: &str,
        data: &str,
    ) -> BridgeResult<c_int> {
        let context = self.handles.require::<CompileContextPtr>(ccontext)?;
        // Safety: the host passes the address of a recursion guard function
        let guard = unsafe { callback_from_addr::<RecursionGuardFn>(codec::decode_address(guard)?) };
        Ok(self
            .engine
            .set_compile_recursion_guard(context, guard, user_data(data)?))
    }

    pub fn match_context_create(&mut self, gcontext: &str) -> BridgeResult<String> {
        let general = self.general(gcontext)?;
        let context = self.engine.match_context_create(Some(general));
        self.register(context.map(Resource::MatchContext), ResourceKind::MatchContext)
    }

    pub fn match_context_copy(&mut self, mcontext: &str) -> BridgeResult<String> {
        let source = self.handles.require::<MatchContextPtr>(mcontext)?;
        let copy = self.engine.match_context_copy(source);
        self.register(copy.map(Resource::MatchContext), ResourceKind::MatchContext)
    }

    pub fn match_context_free(&mut self, mcontext: &str) -> BridgeResult<()> {
        if let Some(context) = self.release::<MatchContextPtr>(mcontext)? {
            self.engine.match_context_free(context);
        }
        Ok(())
    }

    pub fn set_callout(&mut self, mcontext: &str, callout: &str, data: &str) -> BridgeResult<c_int> {
        let context = self.handles.require::<MatchContextPtr>(mcontext)?;
        // Safety: the host passes the address of a callout function
        let callout = unsafe { callback_from_addr::<CalloutFn>(codec::decode_address(callout)?) };
        Ok(self.engine.set_callout(context, callout, user_data(data)?))
    }

    pub fn set_offset_limit(&mut self, mcontext: &str, limit: usize) -> BridgeResult<c_int> {
        let context = self.handles.require::<MatchContextPtr>(mcontext)?;
        Ok(self.engine.set_offset_limit(context, limit))
    }

    pub fn set_heap_limit(&mut self, mcontext: &str, limit: u32) -> BridgeResult<c_int> {
        let context = self.handles.require::<MatchContextPtr>(mcontext)?;
        Ok(self.engine.set_heap_limit(context, limit))
    }

    pub fn set_match_limit(&mut self, mcontext: &str, limit: u32) -> BridgeResult<c_int> {
        let context = self.handles.require::<MatchContextPtr>(mcontext)?;
        Ok(self.engine.set_match_limit(context, limit))
    }

    pub fn set_depth_limit(&mut self, mcontext: &str, limit: u32) -> BridgeResult<c_int> {
        let context = self.handles.require::<MatchContextPtr>(mcontext)?;
        Ok(self.engine.set_depth_limit(context, limit))
    }
}
