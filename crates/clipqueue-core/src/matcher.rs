//! Signature registry: `hash → [registration]`.
//!
//! Buckets keep insertion order.  A lookup hashes the query, then scans the
//! bucket for the first *structurally equal* signature, so two different
//! inputs that collide on the 64-bit hash can never trigger each other's
//! callback.  Expected cardinality is tens of hotkeys; a linear scan of a
//! bucket is all that is needed.
//!
//! The matcher is generic over the callback type `C` so the core stays free
//! of any particular async runtime or closure shape.  The host stores
//! `Arc<dyn Fn() -> BoxFuture<..>>` actions here.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, trace};

use crate::signature::InputSignature;

/// One `(signature, id, callback)` entry.
#[derive(Debug, Clone)]
pub struct Registration<C> {
    pub signature: InputSignature,
    pub id: String,
    pub callback: C,
}

/// Concurrent signature registry.
///
/// `match_signature` takes the read lock, so lookups from the input hook run
/// concurrently with each other; mutations take the write lock.
#[derive(Debug)]
pub struct SignatureMatcher<C> {
    buckets: RwLock<HashMap<u64, Vec<Registration<C>>>>,
}

impl<C: Clone> Default for SignatureMatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone> SignatureMatcher<C> {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a registration to the bucket for `signature`'s hash.
    ///
    /// Duplicate ids and duplicate signatures are both allowed.
    pub fn register(&self, signature: InputSignature, id: impl Into<String>, callback: C) {
        let id = id.into();
        debug!(id = %id, hotkey = %signature.display_hint(), hash = signature.hash(), "registering signature");
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        buckets
            .entry(signature.hash())
            .or_default()
            .push(Registration {
                signature,
                id,
                callback,
            });
    }

    /// Removes the first registration with `id`.  Unknown ids are ignored.
    pub fn unregister(&self, id: &str) {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);

        let found = buckets.iter_mut().find_map(|(&hash, regs)| {
            regs.iter()
                .position(|r| r.id == id)
                .map(|index| (hash, index))
        });

        match found {
            Some((hash, index)) => {
                let now_empty = match buckets.get_mut(&hash) {
                    Some(regs) => {
                        regs.remove(index);
                        regs.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    buckets.remove(&hash);
                }
                debug!(id, "unregistered signature");
            }
            None => trace!(id, "unregister: id not registered"),
        }
    }

    /// Drops every registration (configuration reload).
    pub fn unregister_all(&self) {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        buckets.clear();
        debug!("cleared signature registry");
    }

    /// Returns the callback of the first registration equal to `signature`.
    pub fn match_signature(&self, signature: &InputSignature) -> Option<C> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        buckets
            .get(&signature.hash())?
            .iter()
            .find(|r| r.signature == *signature)
            .map(|r| r.callback.clone())
    }

    /// `(id, signature)` pairs of every registration, in no particular order.
    pub fn registrations(&self) -> Vec<(String, InputSignature)> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        buckets
            .values()
            .flatten()
            .map(|r| (r.id.clone(), r.signature.clone()))
            .collect()
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of hash buckets currently allocated.
    pub fn bucket_count(&self) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Test hook: registers `signature` under a forced bucket key so
    /// collision handling can be exercised without finding a real collision.
    #[cfg(test)]
    fn register_in_bucket(&self, bucket: u64, signature: InputSignature, id: &str, callback: C) {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        buckets.entry(bucket).or_default().push(Registration {
            signature,
            id: id.to_string(),
            callback,
        });
    }
}
