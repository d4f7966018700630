//! Decoded scripts keyed by id.
//!
//! Every `put` swaps in a freshly allocated [`Script`]; nothing mutates a
//! stored op list in place. Decoding happens before the swap, so a bad buffer
//! never disturbs the entry it was meant to replace.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use scene_script::{DecodeError, Op, decode};

/// Well-known id of the script a redraw starts from.
pub const ROOT_ID: &str = "_root_";

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    id: String,
    ops: Vec<Op>,
    generation: u64,
}

impl Script {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Cache generation at which this version was stored.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Decodes every entry of a batch, failing on the first bad buffer.
///
/// # Errors
/// Returns the first [`DecodeError`]; nothing is returned for the other entries.
pub fn decode_batch<K, B>(entries: &[(K, B)]) -> Result<Vec<(String, Vec<Op>)>, DecodeError>
where
    K: AsRef<str>,
    B: AsRef<[u8]>,
{
    entries
        .iter()
        .map(|(id, bytes)| decode(bytes.as_ref()).map(|ops| (id.as_ref().to_owned(), ops)))
        .collect()
}

#[derive(Debug, Default)]
pub struct ScriptCache {
    scripts: HashMap<String, Arc<Script>>,
    root: Option<String>,
    generation: u64,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for `id`. Storing [`ROOT_ID`] designates it root.
    ///
    /// Returns the generation assigned to the new version.
    pub fn put(&mut self, id: impl Into<String>, ops: Vec<Op>) -> u64 {
        let id = id.into();
        self.generation += 1;
        if id == ROOT_ID {
            self.root = Some(id.clone());
        }
        debug!(target: "renderer", "script `{id}` stored with {} ops", ops.len());
        let script = Arc::new(Script {
            id: id.clone(),
            ops,
            generation: self.generation,
        });
        self.scripts.insert(id, script);
        self.generation
    }

    /// Decodes `bytes` and stores the result under `id`.
    ///
    /// # Errors
    /// Returns the [`DecodeError`]; the previous entry for `id` is untouched.
    pub fn put_encoded(&mut self, id: &str, bytes: &[u8]) -> Result<u64, DecodeError> {
        let ops = decode(bytes)?;
        Ok(self.put(id, ops))
    }

    /// Stores a set of decoded scripts in order.
    pub fn put_batch(&mut self, entries: Vec<(String, Vec<Op>)>) {
        for (id, ops) in entries {
            self.put(id, ops);
        }
    }

    /// Decodes every entry, then stores them all. One bad buffer rejects the
    /// batch and leaves the cache as it was.
    ///
    /// # Errors
    /// Returns the first [`DecodeError`] in entry order.
    pub fn put_encoded_batch<K, B>(&mut self, entries: &[(K, B)]) -> Result<usize, DecodeError>
    where
        K: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let staged = decode_batch(entries)?;
        let count = staged.len();
        self.put_batch(staged);
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<&Script> {
        self.scripts.get(id).map(AsRef::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scripts.contains_key(id)
    }

    /// Removes `id`. Deleting the root also clears the root designation.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.scripts.remove(id).is_some();
        if self.root.as_deref() == Some(id) {
            self.root = None;
        }
        if removed {
            debug!(target: "renderer", "script `{id}` deleted");
        }
        removed
    }

    /// Designates `id` as root. The script need not exist yet.
    pub fn set_root(&mut self, id: impl Into<String>) {
        self.root = Some(id.into());
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// The root script, if one is designated and currently stored.
    pub fn root(&self) -> Option<&Script> {
        self.root.as_deref().and_then(|id| self.get(id))
    }

    /// Drops every script and the root designation.
    pub fn clear(&mut self) {
        self.scripts.clear();
        self.root = None;
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_script::testing::ScriptBuilder;
    use scene_script::{Color, Paint};

    fn ops(color: Color) -> Vec<Op> {
        vec![Op::FillPaint(Paint::Color(color))]
    }

    #[test]
    fn put_then_get_returns_ops() {
        let mut cache = ScriptCache::new();
        cache.put("a", ops(Color::BLACK));
        assert_eq!(cache.get("a").unwrap().ops(), ops(Color::BLACK).as_slice());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_replaces_whole_entry() {
        let mut cache = ScriptCache::new();
        let first = cache.put("a", ops(Color::BLACK));
        let second = cache.put("a", ops(Color::WHITE));
        assert!(second > first);
        assert_eq!(cache.get("a").unwrap().ops(), ops(Color::WHITE).as_slice());
    }

    #[test]
    fn failed_decode_keeps_previous_entry() {
        let mut cache = ScriptCache::new();
        let good = ScriptBuilder::new().push_state().pop_state().finish();
        cache.put_encoded("a", &good).unwrap();
        assert!(cache.put_encoded("a", &[0xde, 0xad]).is_err());
        assert_eq!(cache.get("a").unwrap().ops(), &[Op::PushState, Op::PopState]);
    }

    #[test]
    fn failed_batch_applies_nothing() {
        let mut cache = ScriptCache::new();
        let good = ScriptBuilder::new().push_state().finish();
        let entries = vec![("x", good.clone()), ("y", vec![0xff, 0xff])];
        assert!(cache.put_encoded_batch(&entries).is_err());
        assert!(cache.is_empty());

        let entries = vec![("x", good.clone()), ("y", good)];
        assert_eq!(cache.put_encoded_batch(&entries).unwrap(), 2);
        assert!(cache.contains("x") && cache.contains("y"));
    }

    #[test]
    fn root_follows_well_known_id() {
        let mut cache = ScriptCache::new();
        assert!(cache.root().is_none());
        cache.put(ROOT_ID, ops(Color::BLACK));
        assert_eq!(cache.root().unwrap().id(), ROOT_ID);

        cache.put("other", Vec::new());
        assert!(cache.delete("other"));
        assert!(cache.root().is_some());

        assert!(cache.delete(ROOT_ID));
        assert!(cache.root_id().is_none());
        cache.put(ROOT_ID, Vec::new());
        assert!(cache.root().is_some());
    }

    #[test]
    fn explicit_root_resolves_once_stored() {
        let mut cache = ScriptCache::new();
        cache.set_root("main");
        assert!(cache.root().is_none());
        cache.put("main", Vec::new());
        assert_eq!(cache.root().unwrap().id(), "main");
    }

    #[test]
    fn clear_drops_root() {
        let mut cache = ScriptCache::new();
        cache.put(ROOT_ID, Vec::new());
        cache.put("child", Vec::new());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.root_id().is_none());
    }
}
