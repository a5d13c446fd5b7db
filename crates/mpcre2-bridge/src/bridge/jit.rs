use super::contexts::user_data;
use super::Bridge;
use crate::engine::types::callback_from_addr;
use crate::engine::{CodePtr, JitCallbackFn, JitStackPtr, MatchContextPtr, RegexEngine};
use crate::error::BridgeResult;
use crate::handle::{codec, Resource, ResourceKind};
use crate::options::{self, JIT};
use std::ffi::c_int;
use std::ptr::null_mut;

impl<E: RegexEngine> Bridge<E> {
    pub fn jit_compile(&mut self, code: &str, options: &str) -> BridgeResult<c_int> {
        let code = self.handles.require::<CodePtr>(code)?;
        let options = options::parse(&JIT, options, &*self.memory)?;
        Ok(self.engine.jit_compile(code, options))
    }

    pub fn jit_free_unused_memory(&mut self, gcontext: &str) -> BridgeResult<()> {
        let general = self.general(gcontext)?;
        self.engine.jit_free_unused_memory(Some(general));
        Ok(())
    }

    pub fn jit_stack_create(
        &mut self,
        start_size: usize,
        max_size: usize,
        gcontext: &str,
    ) -> BridgeResult<String> {
        let general = self.general(gcontext)?;
        let stack = self.engine.jit_stack_create(start_size, max_size, Some(general));
        self.register(stack.map(Resource::JitStack), ResourceKind::JitStack)
    }

    /// Choose the JIT stack for matches run with `mcontext`
    ///
    /// With a callback address, `data` is passed to it untouched. Without
    /// one, `data` names a stack from `jit_stack_create`, or is a sentinel
    /// for the engine's built-in stack.
    pub fn jit_stack_assign(&mut self, mcontext: &str, callback: &str, data: &str) -> BridgeResult<()> {
        let context = self.handles.require::<MatchContextPtr>(mcontext)?;
        match codec::decode_address(callback)? {
            Some(address) => {
                // Safety: the host passes the address of a JIT stack callback
                let callback = unsafe { callback_from_addr::<JitCallbackFn>(Some(address)) };
                self.engine.jit_stack_assign(context, callback, user_data(data)?);
            }
            None => {
                let stack = self
                    .handles
                    .get_as::<JitStackPtr>(data)?
                    .map_or(null_mut(), JitStackPtr::as_ptr);
                self.engine.jit_stack_assign(context, None, stack);
            }
        }
        Ok(())
    }

    pub fn jit_stack_free(&mut self, stack: &str) -> BridgeResult<()> {
        if let Some(stack) = self.release::<JitStackPtr>(stack)? {
            self.engine.jit_stack_free(stack);
        }
        Ok(())
    }
}
