//! Formatting Cache Module
//!
//! Content-addressed cache for rendered text. Unlike the document tier it
//! has no version tracking: keys are a hash of the input text, paired with a
//! fingerprint of the formatting options that affect output. A fingerprint
//! mismatch or an aged-out entry is evicted on lookup, not just skipped.
//!
//! The options struct *is* the fingerprint allow-list: only fields that
//! change the rendered output belong in it.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use ahash::AHasher;
use serde::Serialize;
use tracing::debug;

use crate::cache::now_millis;

/// Fixed maximum entry age: five minutes.
pub const MAX_AGE_MS: u64 = 5 * 60 * 1000;

const DEFAULT_MAX_SIZE: usize = 50;
const DEFAULT_MAX_MEMORY: usize = 5 * 1024 * 1024;

// == Format Options ==
/// The formatting options that affect rendered output.
///
/// Serialized once per lookup to form the cache fingerprint; options outside
/// this struct can churn without causing misses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatOptions {
    pub indent_size: usize,
    pub insert_spaces: bool,
    pub braces_on_new_line: bool,
    pub space_before_open_paren: bool,
    pub space_around_operators: bool,
    pub max_line_length: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            insert_spaces: true,
            braces_on_new_line: false,
            space_before_open_paren: false,
            space_around_operators: true,
            max_line_length: 100,
        }
    }
}

impl FormatOptions {
    fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// == Format Entry ==
#[derive(Debug, Clone)]
struct FormatEntry {
    fingerprint: String,
    result: String,
    timestamp: u64,
    size: usize,
}

// == Counters ==
#[derive(Debug, Default, Clone)]
struct Counters {
    total_requests: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    memory_evictions: u64,
    age_evictions: u64,
    total_size_added: u64,
    total_size_evicted: u64,
    peak_memory: u64,
    cleanup_count: u64,
    last_cleanup_ms: u64,
}

// == Formatting Cache ==
/// Content-addressed cache for formatted text with TTL, size and memory
/// eviction plus a reporting layer.
#[derive(Debug)]
pub struct FormattingCache {
    entries: HashMap<u64, FormatEntry>,
    max_size: usize,
    max_memory: usize,
    memory_used: usize,
    counters: Counters,
}

impl Default for FormattingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FormattingCache {
    // == Constructor ==
    /// Creates a cache with the defaults: 50 entries, 5 MB.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_SIZE, DEFAULT_MAX_MEMORY)
    }

    /// Creates a cache with explicit entry and memory limits.
    pub fn with_limits(max_size: usize, max_memory: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            max_memory,
            memory_used: 0,
            counters: Counters {
                last_cleanup_ms: now_millis(),
                ..Counters::default()
            },
        }
    }

    fn content_key(text: &str) -> u64 {
        let mut hasher = AHasher::default();
        text.hash(&mut hasher);
        hasher.finish()
    }

    // == Get ==
    /// Looks up the formatted result for this text under these options.
    ///
    /// Absent key, fingerprint mismatch, and age expiry are all misses; the
    /// latter two also delete the stale entry on the spot.
    pub fn get(&mut self, text: &str, options: &FormatOptions) -> Option<String> {
        self.counters.total_requests += 1;

        let key = Self::content_key(text);
        let fingerprint = options.fingerprint();
        let now = now_millis();

        let age_expired = match self.entries.get_mut(&key) {
            None => {
                self.counters.misses += 1;
                return None;
            }
            Some(entry) => {
                if entry.fingerprint != fingerprint {
                    false
                } else if now.saturating_sub(entry.timestamp) > MAX_AGE_MS {
                    true
                } else {
                    entry.timestamp = now;
                    self.counters.hits += 1;
                    return Some(entry.result.clone());
                }
            }
        };

        // Stale entry: evict it, then miss
        if let Some(entry) = self.entries.remove(&key) {
            self.memory_used = self.memory_used.saturating_sub(entry.size);
            self.counters.total_size_evicted += entry.size as u64;
            self.counters.evictions += 1;
            if age_expired {
                self.counters.age_evictions += 1;
            }
        }
        self.counters.misses += 1;
        None
    }

    // == Set ==
    /// Caches a formatted result.
    ///
    /// Entries above a quarter of the memory budget are rejected outright:
    /// too big to cache, no eviction attempted. Otherwise older entries are
    /// evicted (count limit, then memory limit) until the new one fits.
    pub fn set(&mut self, text: &str, options: &FormatOptions, result: impl Into<String>) {
        let result = result.into();
        let size = text.len() + result.len();

        if size > self.max_memory / 4 {
            debug!(size, "formatted result too large to cache");
            return;
        }

        let key = Self::content_key(text);

        // Replace wholesale: the old entry's size must not linger
        if let Some(old) = self.entries.remove(&key) {
            self.memory_used = self.memory_used.saturating_sub(old.size);
            self.counters.total_size_evicted += old.size as u64;
        }

        self.evict_if_needed(size);

        self.entries.insert(
            key,
            FormatEntry {
                fingerprint: options.fingerprint(),
                result,
                timestamp: now_millis(),
                size,
            },
        );
        self.memory_used += size;

        self.counters.total_size_added += size as u64;
        if self.memory_used as u64 > self.counters.peak_memory {
            self.counters.peak_memory = self.memory_used as u64;
        }
    }

    /// Oldest-timestamp-first eviction: first down to the entry-count cap,
    /// then until the incoming entry fits in the memory budget.
    fn evict_if_needed(&mut self, incoming: usize) {
        let mut ordered: Vec<(u64, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (*key, entry.timestamp))
            .collect();
        ordered.sort_by_key(|(_, timestamp)| *timestamp);
        let mut queue = ordered.into_iter();

        while self.entries.len() >= self.max_size {
            let Some((key, _)) = queue.next() else { break };
            if let Some(entry) = self.entries.remove(&key) {
                self.memory_used = self.memory_used.saturating_sub(entry.size);
                self.counters.total_size_evicted += entry.size as u64;
                self.counters.evictions += 1;
            }
        }

        while self.memory_used + incoming > self.max_memory {
            let Some((key, _)) = queue.next() else { break };
            if let Some(entry) = self.entries.remove(&key) {
                self.memory_used = self.memory_used.saturating_sub(entry.size);
                self.counters.total_size_evicted += entry.size as u64;
                self.counters.evictions += 1;
                self.counters.memory_evictions += 1;
            }
        }
    }

    // == Clear ==
    /// Drops every entry; counters survive (the drops count as evictions).
    pub fn clear(&mut self) {
        self.counters.total_size_evicted += self.memory_used as u64;
        self.counters.evictions += self.entries.len() as u64;
        self.entries.clear();
        self.memory_used = 0;
    }

    // == Cleanup Expired ==
    /// Removes every entry older than [`MAX_AGE_MS`]. Returns the number
    /// removed. This is the periodic sweep body; wire it to
    /// [`spawn_cleanup_task`](crate::tasks::spawn_cleanup_task) from the
    /// owner when a background sweep is wanted.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = now_millis();
        let expired: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_sub(entry.timestamp) > MAX_AGE_MS)
            .map(|(key, _)| *key)
            .collect();

        for key in &expired {
            if let Some(entry) = self.entries.remove(key) {
                self.memory_used = self.memory_used.saturating_sub(entry.size);
                self.counters.total_size_evicted += entry.size as u64;
                self.counters.evictions += 1;
                self.counters.age_evictions += 1;
            }
        }

        if !expired.is_empty() {
            self.counters.cleanup_count += 1;
            self.counters.last_cleanup_ms = now;
        }
        expired.len()
    }

    // == Reset Stats ==
    /// Zeroes the counters; peak memory restarts from current usage.
    pub fn reset_stats(&mut self) {
        self.counters = Counters {
            peak_memory: self.memory_used as u64,
            last_cleanup_ms: now_millis(),
            ..Counters::default()
        };
    }

    // == Length ==
    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current approximate memory usage in bytes.
    pub fn memory_used(&self) -> usize {
        self.memory_used
    }

    // == Stats ==
    /// Detailed report: counters, rates, and tuning recommendations.
    pub fn stats(&self) -> FormattingReport {
        let c = &self.counters;
        let pct = |part: u64| {
            if c.total_requests == 0 {
                0.0
            } else {
                part as f64 / c.total_requests as f64 * 100.0
            }
        };

        FormattingReport {
            size: self.entries.len(),
            memory_used: self.memory_used,
            max_size: self.max_size,
            max_memory: self.max_memory,
            memory_usage_pct: if self.max_memory == 0 {
                0.0
            } else {
                self.memory_used as f64 / self.max_memory as f64 * 100.0
            },
            total_requests: c.total_requests,
            hits: c.hits,
            misses: c.misses,
            hit_rate_pct: pct(c.hits),
            miss_rate_pct: pct(c.misses),
            evictions: c.evictions,
            memory_evictions: c.memory_evictions,
            age_evictions: c.age_evictions,
            eviction_rate_pct: pct(c.evictions),
            total_size_added: c.total_size_added,
            total_size_evicted: c.total_size_evicted,
            average_entry_size: if self.entries.is_empty() {
                0
            } else {
                self.memory_used as u64 / self.entries.len() as u64
            },
            peak_memory: c.peak_memory,
            cleanup_count: c.cleanup_count,
            last_cleanup_ms: c.last_cleanup_ms,
            efficiency: self.efficiency(),
            recommendations: self.recommendations(),
        }
    }

    fn efficiency(&self) -> Efficiency {
        let c = &self.counters;
        if c.total_requests == 0 {
            return Efficiency {
                score: 0,
                level: EfficiencyLevel::Poor,
                description: "no cache activity".to_string(),
            };
        }

        let score = (c.hits as f64 / c.total_requests as f64 * 100.0).round() as u32;
        let (level, description) = match score {
            80.. => (EfficiencyLevel::Excellent, "cache efficiency is excellent"),
            60..=79 => (EfficiencyLevel::Good, "cache efficiency is good"),
            40..=59 => (EfficiencyLevel::Fair, "cache efficiency is fair"),
            _ => (EfficiencyLevel::Poor, "cache efficiency is poor"),
        };
        Efficiency {
            score,
            level,
            description: description.to_string(),
        }
    }

    fn recommendations(&self) -> Vec<String> {
        let c = &self.counters;
        let mut out = Vec::new();

        let hit_rate = if c.total_requests == 0 {
            0.0
        } else {
            c.hits as f64 / c.total_requests as f64
        };

        if hit_rate < 0.5 {
            out.push("Hit rate is low; consider a larger cache or a different keying scheme".to_string());
        }
        if c.memory_evictions as f64 > c.total_requests as f64 * 0.1 {
            out.push("Memory evictions are frequent; consider raising the memory budget".to_string());
        }
        if c.age_evictions as f64 > c.total_requests as f64 * 0.2 {
            out.push("Age evictions are frequent; consider a longer maximum entry age".to_string());
        }
        if self.memory_used as f64 > self.max_memory as f64 * 0.9 {
            out.push("Memory usage is close to the budget; consider raising the limit".to_string());
        }
        if out.is_empty() {
            out.push("Cache is operating well; no tuning needed".to_string());
        }
        out
    }

    /// Backdates an entry's timestamp, for exercising age expiry in tests.
    #[cfg(test)]
    fn backdate(&mut self, text: &str, by_ms: u64) {
        let key = Self::content_key(text);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.timestamp = entry.timestamp.saturating_sub(by_ms);
        }
    }
}

// == Efficiency ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl fmt::Display for EfficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// Hit-rate-derived efficiency score with a verbal rating.
#[derive(Debug, Clone, Serialize)]
pub struct Efficiency {
    pub score: u32,
    pub level: EfficiencyLevel,
    pub description: String,
}

// == Formatting Report ==
/// Serializable statistics snapshot for a [`FormattingCache`].
#[derive(Debug, Clone, Serialize)]
pub struct FormattingReport {
    pub size: usize,
    pub memory_used: usize,
    pub max_size: usize,
    pub max_memory: usize,
    pub memory_usage_pct: f64,
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_pct: f64,
    pub miss_rate_pct: f64,
    pub evictions: u64,
    pub memory_evictions: u64,
    pub age_evictions: u64,
    pub eviction_rate_pct: f64,
    pub total_size_added: u64,
    pub total_size_evicted: u64,
    pub average_entry_size: u64,
    pub peak_memory: u64,
    pub cleanup_count: u64,
    pub last_cleanup_ms: u64,
    pub efficiency: Efficiency,
    pub recommendations: Vec<String>,
}

impl fmt::Display for FormattingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "formatting cache: {} entries, {} of {} ({:.1}%)",
            self.size,
            format_bytes(self.memory_used as u64),
            format_bytes(self.max_memory as u64),
            self.memory_usage_pct
        )?;
        writeln!(
            f,
            "requests: {} ({} hits, {} misses, {:.1}% hit rate)",
            self.total_requests, self.hits, self.misses, self.hit_rate_pct
        )?;
        writeln!(
            f,
            "evictions: {} ({} memory, {} age), peak memory {}",
            self.evictions,
            self.memory_evictions,
            self.age_evictions,
            format_bytes(self.peak_memory)
        )?;
        writeln!(
            f,
            "efficiency: {} ({}/100) - {}",
            self.efficiency.level, self.efficiency.score, self.efficiency.description
        )?;
        for recommendation in &self.recommendations {
            writeln!(f, "- {recommendation}")?;
        }
        Ok(())
    }
}

// == Byte Formatting ==
/// Human-readable byte count, e.g. `2.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let exponent = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[exponent])
}
