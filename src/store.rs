use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::str;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error as ThisError;

/// The Store maps binary keys to binary values. It is shared by every connection and cloned
/// cheaply through reference counting; all access goes through [`Store::lock`], which serializes
/// readers and writers across worker threads.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    keys: HashMap<Bytes, BytesMut>,
}

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("value is not an integer")]
    NotAnInteger,
    #[error("increment or decrement would overflow")]
    Overflow,
}

/// Outcome of a counter update.
#[derive(Debug, PartialEq)]
pub enum Counter {
    /// The key held an integer which was updated to this value.
    Updated(i64),
    /// The key did not exist and was initialized to this value.
    Created(i64),
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    pub fn lock(&self) -> StoreLocked<'_> {
        // Mutations are single map operations, a panic elsewhere cannot leave the map half
        // updated.
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        StoreLocked { state }
    }
}

pub struct StoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> StoreLocked<'a> {
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.state
            .keys
            .get(key)
            .map(|value| Bytes::copy_from_slice(value))
    }

    pub fn set(&mut self, key: Bytes, value: Bytes) {
        self.state.keys.insert(key, BytesMut::from(&value[..]));
    }

    /// Stores `value` and returns the previous value, if any.
    pub fn get_and_set(&mut self, key: Bytes, value: Bytes) -> Option<Bytes> {
        self.state
            .keys
            .insert(key, BytesMut::from(&value[..]))
            .map(BytesMut::freeze)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Bytes> {
        self.state.keys.remove(key).map(BytesMut::freeze)
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.state.keys.contains_key(key)
    }

    pub fn len(&self, key: &[u8]) -> Option<usize> {
        self.state.keys.get(key).map(|value| value.len())
    }

    pub fn size(&self) -> usize {
        self.state.keys.len()
    }

    /// Appends `value` in place, creating the key if needed. Returns the new length.
    pub fn append(&mut self, key: Bytes, value: &[u8]) -> usize {
        let current = self.state.keys.entry(key).or_default();
        current.extend_from_slice(value);
        current.len()
    }

    /// Overwrites the value at `offset`, padding with zero bytes when the current value is
    /// shorter. Returns the new length.
    pub fn set_range(&mut self, key: Bytes, offset: usize, value: &[u8]) -> usize {
        if value.is_empty() {
            return self.len(&key).unwrap_or(0);
        }

        let current = self.state.keys.entry(key).or_default();
        let end = offset + value.len();
        if current.len() < end {
            current.resize(end, 0);
        }
        current[offset..end].copy_from_slice(value);

        current.len()
    }

    /// Adds `delta` to the integer stored at `key`. A missing key is initialized to `delta`.
    /// On error the stored value is left untouched.
    pub fn incr_by(&mut self, key: Bytes, delta: i64) -> Result<Counter, StoreError> {
        let Some(current) = self.state.keys.get_mut(&key) else {
            self.state
                .keys
                .insert(key, BytesMut::from(delta.to_string().as_bytes()));
            return Ok(Counter::Created(delta));
        };

        let value = str::from_utf8(current)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(StoreError::NotAnInteger)?;
        let value = value.checked_add(delta).ok_or(StoreError::Overflow)?;

        current.clear();
        current.extend_from_slice(value.to_string().as_bytes());

        Ok(Counter::Updated(value))
    }
}
