use super::Bridge;
use crate::engine::{CodePtr, ForeignBytes, MatchDataPtr, RegexEngine, Status, SubstringListPtr};
use crate::error::{BridgeError, BridgeResult};
use crate::extract;
use crate::handle::{codec, HandleError, Resource, ResourceKind};
use std::ffi::{c_int, CStr};

impl<E: RegexEngine> Bridge<E> {
    /// Copy a named group into `buffer`; the value is the copied length
    pub fn substring_copy_byname(
        &self,
        match_data: &str,
        name: &CStr,
        buffer: &mut [u8],
    ) -> BridgeResult<Status<usize>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        Ok(self.engine.substring_copy_byname(match_data, name, buffer))
    }

    pub fn substring_copy_bynumber(
        &self,
        match_data: &str,
        number: u32,
        buffer: &mut [u8],
    ) -> BridgeResult<Status<usize>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        Ok(self.engine.substring_copy_bynumber(match_data, number, buffer))
    }

    /// Copy a named group into a new engine buffer
    ///
    /// The value is the buffer token (`"0"` when the engine made none) and
    /// its length. The host frees the buffer with `substring_free`.
    pub fn substring_get_byname(
        &mut self,
        match_data: &str,
        name: &CStr,
    ) -> BridgeResult<Status<(String, usize)>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        let status = self.engine.substring_get_byname(match_data, name);
        Ok(self.register_substring(status))
    }

    pub fn substring_get_bynumber(
        &mut self,
        match_data: &str,
        number: u32,
    ) -> BridgeResult<Status<(String, usize)>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        let status = self.engine.substring_get_bynumber(match_data, number);
        Ok(self.register_substring(status))
    }

    fn register_substring(&mut self, status: Status<Option<ForeignBytes>>) -> Status<(String, usize)> {
        let value = match status.value {
            Some(bytes) => (self.handles.insert(Resource::Substring(bytes)).token(), bytes.len),
            None => (codec::NULL_TOKEN.to_string(), 0),
        };
        Status::new(status.rc, value)
    }

    pub fn substring_free(&mut self, buffer: &str) -> BridgeResult<()> {
        if let Some(bytes) = self
            .handles
            .take(buffer, ResourceKind::Substring)?
            .and_then(|resource| resource.bytes())
        {
            self.engine.substring_free(bytes.ptr.as_ptr());
        }
        Ok(())
    }

    pub fn substring_length_byname(
        &self,
        match_data: &str,
        name: &CStr,
    ) -> BridgeResult<Status<usize>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        Ok(self.engine.substring_length_byname(match_data, name))
    }

    pub fn substring_length_bynumber(
        &self,
        match_data: &str,
        number: u32,
    ) -> BridgeResult<Status<usize>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        Ok(self.engine.substring_length_bynumber(match_data, number))
    }

    pub fn substring_number_from_name(&self, code: &str, name: &CStr) -> BridgeResult<c_int> {
        let code = self.handles.require::<CodePtr>(code)?;
        Ok(self.engine.substring_number_from_name(code, name))
    }

    /// All captured substrings as a list token and a lengths token
    ///
    /// The lengths handle is a child of the list and goes stale with it.
    pub fn substring_list_get(&mut self, match_data: &str) -> BridgeResult<Status<(String, String)>> {
        let match_data = self.handles.require::<MatchDataPtr>(match_data)?;
        let status = self.engine.substring_list_get(match_data);

        let value = match status.value {
            Some(list) => {
                let parent = self.handles.insert(Resource::SubstringList(list));
                let lengths = self
                    .handles
                    .insert_child(parent, Resource::SubstringLengths(list));
                (parent.token(), lengths.token())
            }
            None => (codec::NULL_TOKEN.to_string(), codec::NULL_TOKEN.to_string()),
        };
        Ok(Status::new(status.rc, value))
    }

    pub fn substring_list_free(&mut self, list: &str) -> BridgeResult<()> {
        if let Some(list) = self.release::<SubstringListPtr>(list)? {
            self.engine.substring_list_free(list.list.as_ptr());
        }
        Ok(())
    }

    /// Entries before the list terminator
    pub fn get_substring_list_count(&self, list: &str) -> BridgeResult<usize> {
        let list = self.handles.require::<SubstringListPtr>(list)?;
        // Safety: the table only holds lists that have not been freed
        Ok(unsafe { extract::substring_count(list) })
    }

    /// Entry `index` of a substring list, read through its lengths handle
    pub fn get_mstring_from_substring_list(
        &self,
        list: &str,
        lengths: &str,
        index: usize,
    ) -> BridgeResult<ForeignBytes> {
        let list_ptr = self.handles.require::<SubstringListPtr>(list)?;
        let lengths_resource = self
            .handles
            .resolve_kind(lengths, ResourceKind::SubstringLengths)?
            .map(|(_, resource)| resource)
            .ok_or(HandleError::Required(ResourceKind::SubstringLengths))?;
        if lengths_resource != Resource::SubstringLengths(list_ptr) {
            return Err(BridgeError::UnrelatedLengths {
                list: list.to_string(),
                lengths: lengths.to_string(),
            });
        }
        // Safety: both arrays belong to the same live list
        Ok(unsafe { extract::substring_entry(list_ptr, index) }?)
    }

    /// The first `len` bytes of an engine buffer the host holds a token for
    ///
    /// Accepts substring buffers, serialized patterns, character tables and
    /// pattern data blocks; `len` may not exceed the recorded length.
    pub fn get_mstring_from_buf(&self, buffer: &str, len: usize) -> BridgeResult<ForeignBytes> {
        let (_, resource) = self
            .handles
            .resolve(buffer)?
            .ok_or(HandleError::Required(ResourceKind::Substring))?;
        let bytes = resource.bytes().ok_or_else(|| HandleError::KindMismatch {
            token: buffer.to_string(),
            expected: ResourceKind::Substring,
            actual: resource.kind(),
        })?;
        Ok(extract::buffer_prefix(bytes, len)?)
    }
}
