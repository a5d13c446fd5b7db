use super::{host_sized, Bridge};
use crate::engine::constants::COMPILE_SUCCESS;
use crate::engine::{
    CodePtr, MatchDataPtr, MatchRequest, OvectorPtr, RegexEngine, Status, SubstituteRequest,
};
use crate::error::{BridgeError, BridgeResult};
use crate::extract::{self, MarkSpan};
use crate::handle::{HandleError, Resource, ResourceKind};
use crate::options::{self, COMPILE, MATCH};
use std::ffi::c_int;
use std::ptr::NonNull;

/// Arguments shared by every matcher and `substitute`
#[derive(Debug, Clone, Copy)]
pub struct MatchCall<'a> {
    pub code: &'a str,
    pub subject: &'a [u8],
    pub start_offset: usize,
    pub options: &'a str,
    pub match_data: &'a str,
    pub context: &'a str,
}

/// Result of `compile`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    /// Token of the compiled pattern; `None` when the engine rejected it
    pub code: Option<String>,
    /// `COMPILE_SUCCESS` or the engine's compile error code
    pub error_code: c_int,
    pub error_offset: usize,
}

#[derive(Debug, Clone, Copy)]
enum Matcher {
    Standard,
    Dfa { workspace: usize },
    Jit,
}

impl<E: RegexEngine> Bridge<E> {
    pub fn compile(
        &mut self,
        pattern: &[u8],
        options: &str,
        ccontext: &str,
    ) -> BridgeResult<CompileOutcome> {
        let options = options::parse(&COMPILE, options, &*self.memory)?;
        let context = self
            .contexts
            .compile(&self.engine, &*self.memory, &self.handles, ccontext)?;

        let compiled = self.engine.compile(pattern, options, Some(context.get()));
        drop(context);

        Ok(match compiled {
            Ok(code) => CompileOutcome {
                code: Some(self.handles.insert(Resource::Code(code)).token()),
                error_code: COMPILE_SUCCESS,
                error_offset: 0,
            },
            Err(failure) => {
                log::debug!("compile failed: {} at {}", failure.code, failure.offset);
                CompileOutcome {
                    code: None,
                    error_code: failure.code,
                    error_offset: failure.offset,
                }
            }
        })
    }

    pub fn code_free(&mut self, code: &str) -> BridgeResult<()> {
        if let Some(code) = self.release::<CodePtr>(code)? {
            self.engine.code_free(code);
        }
        Ok(())
    }

    pub fn code_copy(&mut self, code: &str) -> BridgeResult<String> {
        let code = self.handles.require::<CodePtr>(code)?;
        let copy = self.engine.code_copy(code);
        self.register(copy.map(Resource::Code), ResourceKind::Code)
    }

    pub fn code_copy_with_tables(&mut self, code: &str) -> BridgeResult<String> {
        let code = self.handles.require::<CodePtr>(code)?;
        let copy = self.engine.code_copy_with_tables(code);
        self.register(copy.map(Resource::Code), ResourceKind::Code)
    }

    pub fn match_data_create(&mut self, pairs: u32, gcontext: &str) -> BridgeResult<String> {
        let general = self.general(gcontext)?;
        let match_data = self.engine.match_data_create(pairs, Some(general));
        self.register(match_data.map(Resource::MatchData), ResourceKind::MatchData)
    }

    pub fn match_data_create_from_pattern(
        &mut self,
        code: &str,
        gcontext: &str,
    ) -> BridgeResult<String> {
        let code = self.handles.require::<CodePtr>(code)?;
        let general = self.general(gcontext)?;
        let match_data = self.engine.match_data_create_from_pattern(code, Some(general));
        self.register(match_data.map(Resource::MatchData), ResourceKind::MatchData)
    }

    /// Frees the block; its ovector handle dies with it
    pub fn match_data_free(&mut self, match_data: &str) -> BridgeResult<()> {
        if let Some(match_data) = self.release::<MatchDataPtr>(match_data)? {
            self.engine.match_data_free(match_data);
        }
        Ok(())
    }

    pub fn match_pattern(&mut self, call: MatchCall<'_>) -> BridgeResult<c_int> {
        self.run_matcher(call, Matcher::Standard)
    }

    /// `workspace` is the number of ints allocated for this call
    pub fn dfa_match(&mut self, call: MatchCall<'_>, workspace: usize) -> BridgeResult<c_int> {
        self.run_matcher(call, Matcher::Dfa { workspace })
    }

    pub fn jit_match(&mut self, call: MatchCall<'_>) -> BridgeResult<c_int> {
        self.run_matcher(call, Matcher::Jit)
    }

    fn run_matcher(&mut self, call: MatchCall<'_>, matcher: Matcher) -> BridgeResult<c_int> {
        let code = self.handles.require::<CodePtr>(call.code)?;
        let options = options::parse(&MATCH, call.options, &*self.memory)?;
        let match_data = self.handles.require::<MatchDataPtr>(call.match_data)?;
        let context = self
            .contexts
            .matching(&self.engine, &*self.memory, &self.handles, call.context)?;

        let request = MatchRequest {
            code,
            subject: call.subject,
            start_offset: call.start_offset,
            options,
            match_data,
            context: Some(context.get()),
        };
        Ok(match matcher {
            Matcher::Standard => self.engine.match_pattern(request),
            Matcher::Dfa { workspace } => {
                let mut workspace = host_sized(workspace, 0 as c_int)?;
                self.engine.dfa_match(request, &mut workspace)
            }
            Matcher::Jit => self.engine.jit_match(request),
        })
    }

    /// Replace matches of `call.code` with `replacement` into `output`
    ///
    /// A sentinel match data lets the engine use its own block. The status
    /// value is the length the engine reported, which after an overflow with
    /// `PCRE2_SUBSTITUTE_OVERFLOW_LENGTH` is the length it would have needed.
    pub fn substitute(
        &mut self,
        call: MatchCall<'_>,
        replacement: &[u8],
        output: &mut [u8],
    ) -> BridgeResult<Status<usize>> {
        let code = self.handles.require::<CodePtr>(call.code)?;
        let options = options::parse(&MATCH, call.options, &*self.memory)?;
        let match_data = self.handles.get_as::<MatchDataPtr>(call.match_data)?;
        let context = self
            .contexts
            .matching(&self.engine, &*self.memory, &self.handles, call.context)?;

        let request = SubstituteRequest {
            code,
            subject: call.subject,
            start_offset: call.start_offset,
            options,
            match_data,
            context: Some(context.get()),
            replacement,
        };
        Ok(self.engine.substitute(request, output))
    }

    pub fn get_mark(&self, match_data: &str) -> BridgeResult<MarkSpan> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        let mark = self.engine.get_mark(match_data);
        // Safety: the engine returns null or a mark inside a live pattern
        Ok(unsafe { extract::read_mark(mark) })
    }

    pub fn get_ovector_count(&self, match_data: &str) -> BridgeResult<u32> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        Ok(self.engine.get_ovector_count(match_data))
    }

    /// Token for the ovector of a match data block
    ///
    /// The ovector is a child of the block: the same token is returned on
    /// every call and it goes stale when the block is freed.
    pub fn get_ovector_pointer(&mut self, match_data: &str) -> BridgeResult<String> {
        let (parent, resource) = self
            .handles
            .resolve_kind(match_data, ResourceKind::MatchData)?
            .ok_or(HandleError::Required(ResourceKind::MatchData))?;
        if let Some(existing) = self.handles.find_child(parent, ResourceKind::Ovector) {
            return Ok(existing.token());
        }
        let Resource::MatchData(match_data) = resource else {
            return Err(BridgeError::Unavailable(ResourceKind::Ovector));
        };

        let pairs = NonNull::new(self.engine.get_ovector_pointer(match_data))
            .ok_or(BridgeError::Unavailable(ResourceKind::Ovector))?;
        let ovector = OvectorPtr { match_data, pairs };
        Ok(self
            .handles
            .insert_child(parent, Resource::Ovector(ovector))
            .token())
    }

    pub fn get_startchar(&self, match_data: &str) -> BridgeResult<usize> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        Ok(self.engine.get_startchar(match_data))
    }

    /// Start and end offsets of pair `index`
    pub fn get_ov_pair(&self, ovector: &str, index: usize) -> BridgeResult<(usize, usize)> {
        let ovector = self.handles.require::<OvectorPtr>(ovector)?;
        Ok(extract::ovector_pair(&self.engine, ovector, index)?)
    }
}
