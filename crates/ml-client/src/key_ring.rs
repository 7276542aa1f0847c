use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a rate-limited key is skipped
pub const KEY_COOLDOWN: Duration = Duration::from_secs(60);

/// `GROQ_API_KEY`, then `GROQ_API_KEY_2` through `GROQ_API_KEY_9`
pub const MAX_GROQ_KEYS: usize = 9;

/// Collect Groq keys in priority order. Blank values are skipped.
pub fn groq_keys<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    std::iter::once("GROQ_API_KEY".to_string())
        .chain((2..=MAX_GROQ_KEYS).map(|i| format!("GROQ_API_KEY_{}", i)))
        .filter_map(|name| lookup(&name))
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

/// API keys used in turn: when the provider rate-limits the active key, the
/// next key out of cooldown takes over.
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<String>,
    current: AtomicUsize,
    limited_at: Mutex<Vec<Option<Instant>>>,
    cooldown: Duration,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        let limited_at = Mutex::new(vec![None; keys.len()]);
        Self {
            keys,
            current: AtomicUsize::new(0),
            limited_at,
            cooldown: KEY_COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the active key
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Mark `index` as rate-limited and switch to the next key whose cooldown
    /// has expired. `None` when every key is cooling down.
    pub fn rotate_from(&self, index: usize) -> Option<usize> {
        if self.keys.is_empty() {
            return None;
        }

        let now = Instant::now();
        let mut limited_at = self.limited_at.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = limited_at.get_mut(index) {
            *slot = Some(now);
        }

        let len = self.keys.len();
        let next = (1..=len)
            .map(|step| (index + step) % len)
            .find(|&candidate| match limited_at[candidate] {
                Some(at) => now.duration_since(at) >= self.cooldown,
                None => true,
            })?;

        self.current.store(next, Ordering::SeqCst);
        Some(next)
    }
}
