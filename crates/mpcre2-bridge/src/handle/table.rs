//! Generation-tagged handle table
//!
//! Every engine object the host can name lives in one slot. Freeing a
//! resource empties its slot, advances the slot generation and invalidates
//! any child entries (views into the freed object, such as an ovector).

use super::{generation, Generation, Handle, HandleError};
use crate::engine::types::{
    CodePtr, CompileContextPtr, ForeignBytes, GeneralContextPtr, JitStackPtr, MatchContextPtr,
    MatchDataPtr, OvectorPtr, SubstringListPtr,
};
use std::fmt;

/// What a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    GeneralContext(GeneralContextPtr),
    CompileContext(CompileContextPtr),
    MatchContext(MatchContextPtr),
    Code(CodePtr),
    MatchData(MatchDataPtr),
    /// Child of a match data block
    Ovector(OvectorPtr),
    JitStack(JitStackPtr),
    /// Character tables from `maketables`
    Tables(ForeignBytes),
    /// Buffer from `substring_get_*`
    Substring(ForeignBytes),
    SubstringList(SubstringListPtr),
    /// Child of a substring list
    SubstringLengths(SubstringListPtr),
    /// Buffer from `serialize_encode`
    Serialized(ForeignBytes),
    /// Child of a compiled pattern (`FIRSTBITMAP`, `NAMETABLE`)
    PatternData(ForeignBytes),
}

/// Resource discriminant, used in errors and lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    GeneralContext,
    CompileContext,
    MatchContext,
    Code,
    MatchData,
    Ovector,
    JitStack,
    Tables,
    Substring,
    SubstringList,
    SubstringLengths,
    Serialized,
    PatternData,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::GeneralContext => "general context",
            ResourceKind::CompileContext => "compile context",
            ResourceKind::MatchContext => "match context",
            ResourceKind::Code => "compiled pattern",
            ResourceKind::MatchData => "match data block",
            ResourceKind::Ovector => "ovector",
            ResourceKind::JitStack => "JIT stack",
            ResourceKind::Tables => "character table",
            ResourceKind::Substring => "substring buffer",
            ResourceKind::SubstringList => "substring list",
            ResourceKind::SubstringLengths => "substring length array",
            ResourceKind::Serialized => "serialized pattern buffer",
            ResourceKind::PatternData => "pattern data block",
        };
        write!(f, "{}", name)
    }
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::GeneralContext(_) => ResourceKind::GeneralContext,
            Resource::CompileContext(_) => ResourceKind::CompileContext,
            Resource::MatchContext(_) => ResourceKind::MatchContext,
            Resource::Code(_) => ResourceKind::Code,
            Resource::MatchData(_) => ResourceKind::MatchData,
            Resource::Ovector(_) => ResourceKind::Ovector,
            Resource::JitStack(_) => ResourceKind::JitStack,
            Resource::Tables(_) => ResourceKind::Tables,
            Resource::Substring(_) => ResourceKind::Substring,
            Resource::SubstringList(_) => ResourceKind::SubstringList,
            Resource::SubstringLengths(_) => ResourceKind::SubstringLengths,
            Resource::Serialized(_) => ResourceKind::Serialized,
            Resource::PatternData(_) => ResourceKind::PatternData,
        }
    }

    /// Engine-owned bytes with a known length, for kinds that have them
    pub fn bytes(&self) -> Option<ForeignBytes> {
        match self {
            Resource::Tables(bytes)
            | Resource::Substring(bytes)
            | Resource::Serialized(bytes)
            | Resource::PatternData(bytes) => Some(*bytes),
            _ => None,
        }
    }
}

/// Pointer types that map to exactly one resource kind
pub trait TableEntry: Sized {
    const KIND: ResourceKind;
    fn from_resource(resource: Resource) -> Option<Self>;
}

macro_rules! table_entry {
    ($($ty:ty => $variant:ident,)*) => {
        $(impl TableEntry for $ty {
            const KIND: ResourceKind = ResourceKind::$variant;

            fn from_resource(resource: Resource) -> Option<Self> {
                match resource {
                    Resource::$variant(ptr) => Some(ptr),
                    _ => None,
                }
            }
        })*
    };
}

table_entry! {
    GeneralContextPtr => GeneralContext,
    CompileContextPtr => CompileContext,
    MatchContextPtr => MatchContext,
    CodePtr => Code,
    MatchDataPtr => MatchData,
    OvectorPtr => Ovector,
    JitStackPtr => JitStack,
    SubstringListPtr => SubstringList,
}

#[derive(Debug)]
struct Entry {
    resource: Resource,
    parent: Option<Handle>,
    pinned: bool,
}

#[derive(Debug)]
struct Slot {
    generation: Generation,
    entry: Option<Entry>,
}

/// Slot storage for every resource the host holds a token for
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource the host owns
    pub fn insert(&mut self, resource: Resource) -> Handle {
        self.insert_entry(Entry {
            resource,
            parent: None,
            pinned: false,
        })
    }

    /// Register a resource the host may use but never free
    pub fn insert_pinned(&mut self, resource: Resource) -> Handle {
        self.insert_entry(Entry {
            resource,
            parent: None,
            pinned: true,
        })
    }

    /// Register a view that dies with `parent`
    pub fn insert_child(&mut self, parent: Handle, resource: Resource) -> Handle {
        self.insert_entry(Entry {
            resource,
            parent: Some(parent),
            pinned: false,
        })
    }

    fn insert_entry(&mut self, entry: Entry) -> Handle {
        self.live += 1;
        let kind = entry.resource.kind();

        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: generation::FIRST,
                entry: Some(entry),
            });
            Handle::new(index, generation::FIRST)
        };

        log::trace!("handle {} -> {}", handle, kind);
        handle
    }

    /// Look up a live handle
    pub fn get(&self, handle: Handle) -> Result<Resource, HandleError> {
        self.entry(handle).map(|entry| entry.resource)
    }

    fn entry(&self, handle: Handle) -> Result<&Entry, HandleError> {
        let slot = self
            .slots
            .get(handle.index() as usize)
            .filter(|_| handle.generation() != generation::UNINITIALIZED)
            .ok_or_else(|| HandleError::Invalid(handle.token()))?;

        if handle.generation() > slot.generation {
            return Err(HandleError::Invalid(handle.token()));
        }
        match &slot.entry {
            Some(entry) if slot.generation == handle.generation() => Ok(entry),
            _ => Err(HandleError::Stale(handle.token())),
        }
    }

    /// Parse and look up a token; sentinels yield `None`
    pub fn resolve(&self, token: &str) -> Result<Option<(Handle, Resource)>, HandleError> {
        match Handle::parse(token)? {
            None => Ok(None),
            Some(handle) => Ok(Some((handle, self.get(handle)?))),
        }
    }

    /// Resolve a token that must name a resource of `kind`, if present
    pub fn resolve_kind(
        &self,
        token: &str,
        kind: ResourceKind,
    ) -> Result<Option<(Handle, Resource)>, HandleError> {
        match self.resolve(token)? {
            Some((_, resource)) if resource.kind() != kind => Err(HandleError::KindMismatch {
                token: token.to_string(),
                expected: kind,
                actual: resource.kind(),
            }),
            found => Ok(found),
        }
    }

    /// Typed lookup; sentinels yield `None`
    pub fn get_as<T: TableEntry>(&self, token: &str) -> Result<Option<T>, HandleError> {
        Ok(self
            .resolve_kind(token, T::KIND)?
            .and_then(|(_, resource)| T::from_resource(resource)))
    }

    /// Typed lookup of a mandatory resource
    pub fn require<T: TableEntry>(&self, token: &str) -> Result<T, HandleError> {
        self.get_as(token)?.ok_or(HandleError::Required(T::KIND))
    }

    /// Handle of a live child of `parent` with the given kind
    pub fn find_child(&self, parent: Handle, kind: ResourceKind) -> Option<Handle> {
        self.child_where(parent, |resource| resource.kind() == kind)
    }

    /// Handle of a live child of `parent` registered for exactly `resource`
    pub fn find_child_holding(&self, parent: Handle, resource: &Resource) -> Option<Handle> {
        self.child_where(parent, |held| held == resource)
    }

    fn child_where(&self, parent: Handle, wanted: impl Fn(&Resource) -> bool) -> Option<Handle> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .filter(|entry| entry.parent == Some(parent) && wanted(&entry.resource))
                .map(|_| Handle::new(index as u32, slot.generation))
        })
    }

    pub fn parent_of(&self, handle: Handle) -> Result<Option<Handle>, HandleError> {
        self.entry(handle).map(|entry| entry.parent)
    }

    /// Remove the resource named by `token` so the caller can free it
    ///
    /// Sentinels yield `Ok(None)`: freeing nothing is a no-op, as in the
    /// engine. Children of the removed entry are invalidated.
    pub fn take(&mut self, token: &str, kind: ResourceKind) -> Result<Option<Resource>, HandleError> {
        let Some((handle, _)) = self.resolve_kind(token, kind)? else {
            return Ok(None);
        };
        if self.entry(handle)?.pinned {
            return Err(HandleError::Pinned(token.to_string()));
        }
        Ok(self.vacate(handle))
    }

    fn vacate(&mut self, handle: Handle) -> Option<Resource> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        let entry = slot.entry.take()?;
        self.live -= 1;

        // A slot whose generation cannot advance further is retired
        if slot.generation < Generation::MAX {
            slot.generation += 1;
            self.free.push(handle.index());
        }
        log::trace!("handle {} released ({})", handle, entry.resource.kind());

        let children: Vec<Handle> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.entry
                    .as_ref()
                    .filter(|child| child.parent == Some(handle))
                    .map(|_| Handle::new(index as u32, slot.generation))
            })
            .collect();
        for child in children {
            self.vacate(child);
        }

        Some(entry.resource)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of live entries of one kind
    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .filter(|entry| entry.resource.kind() == kind)
            .count()
    }
}
