//! Parse Cache Module
//!
//! Version-aware cache for parse results. The parser itself is an external
//! collaborator behind the [`Parser`] trait; this layer decides when to call
//! it, times the call, and keeps the result keyed by (uri, version).
//!
//! Instances are constructed explicitly and passed down; there is no shared
//! process-wide cache.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{now_millis, CacheStats, FixedEstimator};
use crate::config::DocumentCacheConfig;
use crate::document::{DocumentCache, VersionedResource};
use crate::error::Result;

// == Diagnostic ==
/// Severity of a parser diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// A single parser diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            severity,
            message: message.into(),
            line,
            column,
        }
    }

    /// Error diagnostic anchored at the start of the document.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, 0, 0)
    }
}

// == Parser Collaborator ==
/// The external parser this cache fronts.
///
/// `parse` is expected to be pure with respect to its input text. It may
/// fail; the cache recovers from failures instead of propagating them.
pub trait Parser: Send + Sync {
    type Ast: Clone + Default + Send + Sync + 'static;

    fn parse(&self, text: &str) -> Result<(Self::Ast, Vec<Diagnostic>)>;
}

// == Parsed Document ==
/// A parse result together with its cache metadata.
#[derive(Debug, Clone)]
pub struct ParsedDoc<A> {
    /// Resource version the result was parsed from
    pub version: u64,
    /// The parse tree
    pub ast: A,
    /// Diagnostics collected during the parse
    pub diagnostics: Vec<Diagnostic>,
    /// Last access timestamp (Unix milliseconds)
    pub last_accessed: u64,
    /// How long the parse took, in milliseconds
    pub parse_time_ms: f64,
    /// Source text length in characters
    pub size: usize,
}

impl<A> ParsedDoc<A> {
    /// True when the parse produced at least one error diagnostic.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

// == Parse Metrics ==
#[derive(Debug, Default)]
struct ParseMetrics {
    count: u64,
    total_ms: f64,
}

/// Statistics for a [`ParseCache`]: the underlying cache stats plus the
/// parse-side counters.
#[derive(Debug, Clone, Serialize)]
pub struct ParseCacheStats {
    pub cache: CacheStats,
    pub parse_count: u64,
    pub total_parse_time_ms: f64,
    pub avg_parse_time_ms: f64,
}

// == Parse Cache ==
/// Version-aware parse-result cache around an external parser.
pub struct ParseCache<P: Parser> {
    documents: DocumentCache<ParsedDoc<P::Ast>>,
    parser: P,
    metrics: Mutex<ParseMetrics>,
}

impl<P: Parser> ParseCache<P> {
    // == Constructor ==
    /// Creates a parse cache with the document-tier defaults (50 entries,
    /// 10 MB, 5 minute TTL, 1 minute cleanup).
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, DocumentCacheConfig::default())
    }

    /// Creates a parse cache with an explicit configuration.
    pub fn with_config(parser: P, config: DocumentCacheConfig) -> Self {
        // Sizes are always supplied explicitly on set; the estimator is a
        // fallback only.
        let documents = DocumentCache::with_estimator(config, Arc::new(FixedEstimator::default()));
        Self {
            documents,
            parser,
            metrics: Mutex::new(ParseMetrics::default()),
        }
    }

    // == Get Parsed ==
    /// Returns the parse result for the resource, from cache when the
    /// version still matches, otherwise by invoking the parser.
    ///
    /// A parser failure yields a degenerate result carrying a single error
    /// diagnostic; callers should treat it as a valid outcome, not a fault.
    pub fn get_parsed(&self, resource: &impl VersionedResource) -> ParsedDoc<P::Ast> {
        if let Some(mut parsed) = self.documents.get(resource) {
            // Refreshed on the returned copy only. The stored copy's field is
            // never observable (callers only ever see clones), and TTL runs
            // off the entry-level timestamp, which the lookup itself touched.
            parsed.last_accessed = now_millis();
            return parsed;
        }
        self.parse(resource)
    }

    fn parse(&self, resource: &impl VersionedResource) -> ParsedDoc<P::Ast> {
        let text = resource.text();
        let started = Instant::now();

        let outcome = self.parser.parse(text);
        let parse_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        {
            let mut metrics = self.metrics.lock();
            metrics.count += 1;
            metrics.total_ms += parse_time_ms;
        }

        match outcome {
            Ok((ast, diagnostics)) => {
                let parsed = ParsedDoc {
                    version: resource.version(),
                    ast,
                    diagnostics,
                    last_accessed: now_millis(),
                    parse_time_ms,
                    size: text.len(),
                };
                self.documents
                    .set_with_size(resource, parsed.clone(), text.len() * 2);
                debug!(uri = resource.uri(), parse_time_ms, "parsed and cached");
                parsed
            }
            Err(err) => {
                warn!(uri = resource.uri(), %err, "parse failed, returning degenerate result");
                // Not cached: the next request retries the parser
                ParsedDoc {
                    version: resource.version(),
                    ast: P::Ast::default(),
                    diagnostics: vec![Diagnostic::error(format!("Parse error: {err}"))],
                    last_accessed: now_millis(),
                    parse_time_ms,
                    size: text.len(),
                }
            }
        }
    }

    // == Invalidate ==
    /// Drops every cached parse of the resource.
    pub fn invalidate(&self, uri: &str) -> usize {
        self.documents.invalidate_document(uri)
    }

    /// Drops every cached parse whose key matches the pattern.
    pub fn invalidate_pattern(&self, pattern: &regex::Regex) -> usize {
        self.documents.invalidate_pattern(pattern)
    }

    // == Clear ==
    /// Drops all cached parses and resets the parse counters.
    pub fn clear(&self) {
        self.documents.clear();
        *self.metrics.lock() = ParseMetrics::default();
    }

    // == Stats ==
    /// Cache statistics plus parse counters.
    pub fn stats(&self) -> ParseCacheStats {
        let metrics = self.metrics.lock();
        let avg = if metrics.count == 0 {
            0.0
        } else {
            metrics.total_ms / metrics.count as f64
        };
        ParseCacheStats {
            cache: self.documents.stats(),
            parse_count: metrics.count,
            total_parse_time_ms: metrics.total_ms,
            avg_parse_time_ms: avg,
        }
    }

    // == Cleanup ==
    /// Manual sweep of the underlying document cache.
    pub fn cleanup(&self) -> usize {
        self.documents.cleanup()
    }

    // == Dispose ==
    /// Cancels the cleanup task and drops all state. Idempotent.
    pub fn dispose(&self) {
        self.documents.dispose();
    }

    /// The document cache this parse cache is built on.
    pub fn documents(&self) -> &DocumentCache<ParsedDoc<P::Ast>> {
        &self.documents
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestDoc {
        uri: String,
        version: u64,
        text: String,
    }

    impl TestDoc {
        fn new(uri: &str, version: u64, text: &str) -> Self {
            Self {
                uri: uri.to_string(),
                version,
                text: text.to_string(),
            }
        }
    }

    impl VersionedResource for TestDoc {
        fn uri(&self) -> &str {
            &self.uri
        }
        fn version(&self) -> u64 {
            self.version
        }
        fn text(&self) -> &str {
            &self.text
        }
    }

    /// Counts invocations; "fail" as input makes the parse fail.
    struct CountingParser {
        calls: AtomicUsize,
    }

    impl CountingParser {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Parser for CountingParser {
        type Ast = String;

        fn parse(&self, text: &str) -> Result<(String, Vec<Diagnostic>)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "fail" {
                return Err(CacheError::Parse("bad input".to_string()));
            }
            Ok((text.to_uppercase(), Vec::new()))
        }
    }

    fn test_config() -> DocumentCacheConfig {
        DocumentCacheConfig::default().with_base(
            CacheConfig::default()
                .with_ttl_ms(-1)
                .with_cleanup_interval_ms(0),
        )
    }

    #[test]
    fn test_miss_parses_and_caches() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());
        let doc = TestDoc::new("file:///a.c", 1, "int main");

        let first = cache.get_parsed(&doc);
        assert_eq!(first.ast, "INT MAIN");
        assert_eq!(first.version, 1);
        assert_eq!(first.size, "int main".len());
        assert_eq!(cache.parser.calls(), 1);

        // Second request is served from cache
        let second = cache.get_parsed(&doc);
        assert_eq!(second.ast, "INT MAIN");
        assert_eq!(cache.parser.calls(), 1);
        assert_eq!(cache.stats().cache.hits, 1);
    }

    #[test]
    fn test_hit_refreshes_returned_access_time() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());
        let doc = TestDoc::new("file:///a.c", 1, "int main");

        let first = cache.get_parsed(&doc);
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = cache.get_parsed(&doc);

        // Each returned copy reflects its own access, not the parse time
        assert!(second.last_accessed > first.last_accessed);
        assert_eq!(cache.parser.calls(), 1);
    }

    #[test]
    fn test_version_bump_reparses() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());

        cache.get_parsed(&TestDoc::new("file:///a.c", 1, "one"));
        cache.get_parsed(&TestDoc::new("file:///a.c", 2, "two"));

        assert_eq!(cache.parser.calls(), 2);
        let stats = cache.stats();
        assert_eq!(stats.parse_count, 2);
    }

    #[test]
    fn test_parser_failure_yields_degenerate_result() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());
        let doc = TestDoc::new("file:///bad.c", 1, "fail");

        let parsed = cache.get_parsed(&doc);
        assert!(parsed.has_errors());
        assert_eq!(parsed.ast, String::default());
        assert!(parsed.diagnostics[0].message.contains("Parse error"));

        // Failures are not cached: the parser is retried
        cache.get_parsed(&doc);
        assert_eq!(cache.parser.calls(), 2);
    }

    #[test]
    fn test_invalidate_forces_reparse() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());
        let doc = TestDoc::new("file:///a.c", 1, "text");

        cache.get_parsed(&doc);
        cache.invalidate("file:///a.c");
        cache.get_parsed(&doc);

        assert_eq!(cache.parser.calls(), 2);
    }

    #[test]
    fn test_clear_resets_parse_counters() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());
        cache.get_parsed(&TestDoc::new("file:///a.c", 1, "text"));
        assert_eq!(cache.stats().parse_count, 1);

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.parse_count, 0);
        assert_eq!(stats.total_parse_time_ms, 0.0);
        assert_eq!(stats.cache.size, 0);
    }

    #[test]
    fn test_stats_average() {
        let cache = ParseCache::with_config(CountingParser::new(), test_config());
        cache.get_parsed(&TestDoc::new("file:///a.c", 1, "a"));
        cache.get_parsed(&TestDoc::new("file:///b.c", 1, "b"));

        let stats = cache.stats();
        assert_eq!(stats.parse_count, 2);
        assert!(stats.avg_parse_time_ms >= 0.0);
        assert!((stats.avg_parse_time_ms * 2.0 - stats.total_parse_time_ms).abs() < 1e-9);
    }
}
