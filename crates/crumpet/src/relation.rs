//! Lazy relation handles carried by generated record structs.
//!
//! A handle starts unlinked, is linked to its owning backend when the
//! instance is materialized, and resolves on first access (or immediately
//! when the relation was included in the originating query). A failed load
//! leaves the handle linked, so the next access re-attempts.

use crate::engine::{Attachment, ErasedRecord, IdentityKey, LazyGroup};

use crumpet_core::{Error, Result};

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

/// One instance's view into its batch's shared lazy-relation state: the
/// first access through any sibling loads the related rows of the whole
/// batch in a single query.
#[derive(Clone)]
pub struct Link {
    pub(crate) group: Arc<LazyGroup>,
    /// The instance's own join key; `None` when a link column is null, in
    /// which case the relation resolves empty without a query.
    pub(crate) key: Option<IdentityKey>,
}

impl Link {
    fn load(&self) -> Result<Vec<ErasedRecord>> {
        self.group.fetch(self.key.as_ref())
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").finish_non_exhaustive()
    }
}

enum State<T> {
    Unlinked,
    Linked(Link),
    Resolved(T),
}

fn downcast<T: Any + Send + Sync>(record: ErasedRecord) -> Result<Arc<T>> {
    record
        .downcast::<T>()
        .map_err(|_| Error::msg("relation resolved to a different model type"))
}

/// A `many` relation.
pub struct HasMany<T> {
    state: Mutex<State<Vec<Arc<T>>>>,
}

impl<T: Any + Send + Sync> HasMany<T> {
    pub fn unlinked() -> HasMany<T> {
        HasMany {
            state: Mutex::new(State::Unlinked),
        }
    }

    /// Wires the handle after materialization: either the prefetched rows
    /// or a link for later resolution.
    pub fn attach(&self, attachment: Attachment) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match attachment {
            Attachment::Resolved(records) => {
                let items = records
                    .into_iter()
                    .map(downcast::<T>)
                    .collect::<Result<Vec<_>>>()?;
                *state = State::Resolved(items);
            }
            Attachment::Link(link) => *state = State::Linked(link),
        }
        Ok(())
    }

    /// Returns the related rows, issuing a single query on first access.
    pub fn load(&self, what: &'static str) -> Result<Vec<Arc<T>>> {
        let mut state = self.state.lock().unwrap();
        match &*state {
            State::Resolved(items) => Ok(items.clone()),
            State::Linked(link) => {
                let items = link
                    .load()?
                    .into_iter()
                    .map(downcast::<T>)
                    .collect::<Result<Vec<_>>>()?;
                *state = State::Resolved(items.clone());
                Ok(items)
            }
            State::Unlinked => Err(unresolvable(what)),
        }
    }
}

impl<T> fmt::Debug for HasMany<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(state_name(&self.state))
    }
}

/// The single-row resolution shared by `BelongsTo` and `HasOne`.
struct SingleState<T> {
    state: Mutex<State<Option<Arc<T>>>>,
}

impl<T: Any + Send + Sync> SingleState<T> {
    fn unlinked() -> SingleState<T> {
        SingleState {
            state: Mutex::new(State::Unlinked),
        }
    }

    fn attach(&self, attachment: Attachment) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match attachment {
            Attachment::Resolved(records) => {
                let item = match records.into_iter().next() {
                    Some(record) => Some(downcast::<T>(record)?),
                    None => None,
                };
                *state = State::Resolved(item);
            }
            Attachment::Link(link) => *state = State::Linked(link),
        }
        Ok(())
    }

    fn load(&self, what: &'static str) -> Result<Option<Arc<T>>> {
        let mut state = self.state.lock().unwrap();
        match &*state {
            State::Resolved(item) => Ok(item.clone()),
            State::Linked(link) => {
                let item = match link.load()?.into_iter().next() {
                    Some(record) => Some(downcast::<T>(record)?),
                    None => None,
                };
                *state = State::Resolved(item.clone());
                Ok(item)
            }
            State::Unlinked => Err(unresolvable(what)),
        }
    }
}

/// A to-one relation whose scalar link columns live on this model.
pub struct BelongsTo<T> {
    inner: SingleState<T>,
}

impl<T: Any + Send + Sync> BelongsTo<T> {
    pub fn unlinked() -> BelongsTo<T> {
        BelongsTo {
            inner: SingleState::unlinked(),
        }
    }

    pub fn attach(&self, attachment: Attachment) -> Result<()> {
        self.inner.attach(attachment)
    }

    /// Resolution for a required (`one`) relation; a missing target is a
    /// dangling virtual foreign key.
    pub fn load_required(&self, what: &'static str) -> Result<Arc<T>> {
        self.inner.load(what)?.ok_or_else(|| unresolvable(what))
    }

    pub fn load_optional(&self, what: &'static str) -> Result<Option<Arc<T>>> {
        self.inner.load(what)
    }
}

impl<T> fmt::Debug for BelongsTo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(state_name(&self.inner.state))
    }
}

/// The remote side of a unique foreign key.
pub struct HasOne<T> {
    inner: SingleState<T>,
}

impl<T: Any + Send + Sync> HasOne<T> {
    pub fn unlinked() -> HasOne<T> {
        HasOne {
            inner: SingleState::unlinked(),
        }
    }

    pub fn attach(&self, attachment: Attachment) -> Result<()> {
        self.inner.attach(attachment)
    }

    pub fn load_optional(&self, what: &'static str) -> Result<Option<Arc<T>>> {
        self.inner.load(what)
    }

    pub fn load_required(&self, what: &'static str) -> Result<Arc<T>> {
        self.inner.load(what)?.ok_or_else(|| unresolvable(what))
    }
}

impl<T> fmt::Debug for HasOne<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(state_name(&self.inner.state))
    }
}

fn unresolvable(what: &'static str) -> Error {
    let (model, relation) = what.split_once('.').unwrap_or((what, what));
    Error::relation_unresolvable(model, relation)
}

fn state_name<T>(state: &Mutex<State<T>>) -> &'static str {
    match &*state.lock().unwrap() {
        State::Unlinked => "<unlinked>",
        State::Linked(_) => "<lazy>",
        State::Resolved(_) => "<resolved>",
    }
}
