use super::{host_sized, Bridge};
use crate::engine::{CodePtr, ForeignBytes, RegexEngine, Status};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::{codec, HandleError, Resource, ResourceKind};
use std::ffi::{c_int, c_void};
use std::ptr::null_mut;

/// Separator of code tokens in one host string
pub const CODE_LIST_SEPARATOR: &str = ",";

impl<E: RegexEngine> Bridge<E> {
    /// Serialize the first `count` patterns of a comma-separated token list
    ///
    /// The value is the serialized buffer token and its size in bytes.
    pub fn serialize_encode(
        &mut self,
        codes: &str,
        count: usize,
        gcontext: &str,
    ) -> BridgeResult<Status<(String, usize)>> {
        let tokens: Vec<&str> = codes.split(CODE_LIST_SEPARATOR).map(str::trim).collect();
        if count > tokens.len() {
            return Err(BridgeError::invalid_argument(
                "number_of_codes",
                format!("{} requested but {} code handles given", count, tokens.len()),
            ));
        }
        let codes = tokens[..count]
            .iter()
            .map(|token| self.handles.require::<CodePtr>(token))
            .collect::<Result<Vec<_>, _>>()?;
        let general = self.general(gcontext)?;

        let status = self.engine.serialize_encode(&codes, Some(general));
        let value = match status.value {
            Some(bytes) => (self.handles.insert(Resource::Serialized(bytes)).token(), bytes.len),
            None => (codec::NULL_TOKEN.to_string(), 0),
        };
        Ok(Status::new(status.rc, value))
    }

    /// Rebuild up to `count` patterns from a serialized buffer
    ///
    /// Every decoded pattern gets its own code token, owned by the host.
    pub fn serialize_decode(
        &mut self,
        count: usize,
        bytes: &str,
        gcontext: &str,
    ) -> BridgeResult<Status<Vec<String>>> {
        let bytes = self.serialized(bytes)?;
        let general = self.general(gcontext)?;

        // Never more slots than the buffer holds patterns
        let available = self.engine.serialize_get_number_of_codes(bytes.ptr.as_ptr());
        let count = usize::try_from(available).map_or(count, |available| count.min(available));
        let mut slots: Vec<*mut c_void> = host_sized(count, null_mut())?;
        let rc = self
            .engine
            .serialize_decode(&mut slots, bytes.ptr.as_ptr(), Some(general));

        let decoded = usize::try_from(rc).unwrap_or(0).min(count);
        let tokens = slots[..decoded]
            .iter()
            // Safety: the engine filled the first `rc` slots with patterns
            .filter_map(|slot| unsafe { CodePtr::from_raw(*slot) })
            .map(|code| self.handles.insert(Resource::Code(code)).token())
            .collect();
        Ok(Status::new(rc, tokens))
    }

    pub fn serialize_free(&mut self, bytes: &str) -> BridgeResult<()> {
        if let Some(bytes) = self
            .handles
            .take(bytes, ResourceKind::Serialized)?
            .and_then(|resource| resource.bytes())
        {
            self.engine.serialize_free(bytes.ptr.as_ptr());
        }
        Ok(())
    }

    pub fn serialize_get_number_of_codes(&self, bytes: &str) -> BridgeResult<c_int> {
        let bytes = self.serialized(bytes)?;
        Ok(self.engine.serialize_get_number_of_codes(bytes.ptr.as_ptr()))
    }

    fn serialized(&self, token: &str) -> BridgeResult<ForeignBytes> {
        Ok(self
            .handles
            .resolve_kind(token, ResourceKind::Serialized)?
            .and_then(|(_, resource)| resource.bytes())
            .ok_or(HandleError::Required(ResourceKind::Serialized))?)
    }
}
