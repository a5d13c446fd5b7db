use super::contexts::user_data;
use super::Bridge;
use crate::engine::constants::{
    FIRSTBITMAP_LENGTH, INFO_FIRSTBITMAP, INFO_NAMECOUNT, INFO_NAMEENTRYSIZE, TABLES_LENGTH,
};
use crate::engine::types::callback_from_addr;
use crate::engine::{CalloutEnumerateFn, CodePtr, ForeignBytes, RegexEngine, Status};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::{codec, Handle, HandleError, Resource, ResourceKind};
use crate::options::{self, InfoValue, INFO, NO_OPTIONS, SEPARATOR};
use std::ffi::{c_int, c_void};
use std::ptr::null;

impl<E: RegexEngine> Bridge<E> {
    /// Text of an engine error code, written into `buffer`
    pub fn get_error_message(&self, code: c_int, buffer: &mut [u8]) -> c_int {
        self.engine.get_error_message(code, buffer)
    }

    /// Locale character tables built by the engine
    pub fn maketables(&mut self, gcontext: &str) -> BridgeResult<String> {
        let general = self.general(gcontext)?;
        let tables = self.engine.maketables(Some(general));
        // Safety: a non-null result points at TABLES_LENGTH bytes
        let tables = unsafe { ForeignBytes::from_raw(tables, TABLES_LENGTH) };
        self.register(tables.map(Resource::Tables), ResourceKind::Tables)
    }

    /// Answer one `pattern_info` query as text
    ///
    /// Integer answers are rendered in decimal. `FIRSTBITMAP` and `NAMETABLE`
    /// answers point into the pattern, so they come back as handles that go
    /// stale when the pattern is freed (`"0"` when the pattern has none).
    /// Asking again for the same data returns the same handle.
    pub fn pattern_info(&mut self, code: &str, what: &str) -> BridgeResult<Status<String>> {
        self.info_answer(code, what).map(|(status, _)| status)
    }

    /// `pattern_info` with the answer handed to `deliver`
    ///
    /// A handle this call registered is dropped again if `deliver` fails.
    pub fn pattern_info_with<R>(
        &mut self,
        code: &str,
        what: &str,
        deliver: impl FnOnce(&Status<String>) -> BridgeResult<R>,
    ) -> BridgeResult<R> {
        let (status, registered) = self.info_answer(code, what)?;
        let delivered = deliver(&status);
        if let (Err(_), Some(handle)) = (&delivered, registered) {
            self.handles.take(&handle.token(), ResourceKind::PatternData)?;
        }
        delivered
    }

    /// The answer, plus the handle if one was registered for it just now
    fn info_answer(
        &mut self,
        code: &str,
        what: &str,
    ) -> BridgeResult<(Status<String>, Option<Handle>)> {
        let (parent, _) = self
            .handles
            .resolve_kind(code, ResourceKind::Code)?
            .ok_or(HandleError::Required(ResourceKind::Code))?;
        let code = self.handles.require::<CodePtr>(code)?;

        let selectors = what
            .as_bytes()
            .split(|b| *b == SEPARATOR)
            .filter(|token| !token.is_empty())
            .count();
        if what != NO_OPTIONS && selectors != 1 {
            return Err(BridgeError::InvalidSelector {
                value: what.to_string(),
                count: selectors,
            });
        }
        let what = options::parse(&INFO, what, &*self.memory)?;

        let mut registered = None;
        let status = match InfoValue::of(what) {
            InfoValue::U32 => {
                let (rc, value) = self.query(code, what, 0u32);
                Status::new(rc, value.to_string())
            }
            InfoValue::Size => {
                let (rc, value) = self.query(code, what, 0usize);
                Status::new(rc, value.to_string())
            }
            InfoValue::Bytes => {
                let (rc, ptr) = self.query(code, what, null::<u8>());
                let len = if rc < 0 {
                    0
                } else if what == INFO_FIRSTBITMAP {
                    FIRSTBITMAP_LENGTH
                } else {
                    let (_, count) = self.query(code, INFO_NAMECOUNT, 0u32);
                    let (_, entry_size) = self.query(code, INFO_NAMEENTRYSIZE, 0u32);
                    count as usize * entry_size as usize
                };
                // Safety: the engine reported `len` bytes at `ptr` inside the pattern
                let token = match unsafe { ForeignBytes::from_raw(ptr, len) } {
                    Some(bytes) if rc >= 0 => {
                        let data = Resource::PatternData(bytes);
                        match self.handles.find_child_holding(parent, &data) {
                            Some(known) => known.token(),
                            None => {
                                let fresh = self.handles.insert_child(parent, data);
                                registered = Some(fresh);
                                fresh.token()
                            }
                        }
                    }
                    _ => codec::NULL_TOKEN.to_string(),
                };
                Status::new(rc, token)
            }
        };

        if status.rc < 0 {
            return Ok((Status::new(status.rc, String::new()), None));
        }
        Ok((status, registered))
    }

    /// One raw query; `value` is the slot the engine writes into
    fn query<T: Copy>(&self, code: CodePtr, what: u32, mut value: T) -> (c_int, T) {
        let rc = self
            .engine
            .pattern_info(code, what, &mut value as *mut T as *mut c_void);
        (rc, value)
    }

    pub fn callout_enumerate(&self, code: &str, callback: &str, data: &str) -> BridgeResult<c_int> {
        let code = self.handles.require::<CodePtr>(code)?;
        // Safety: the host passes the address of a callout enumeration function
        let callback =
            unsafe { callback_from_addr::<CalloutEnumerateFn>(codec::decode_address(callback)?) };
        Ok(self.engine.callout_enumerate(code, callback, user_data(data)?))
    }
}
