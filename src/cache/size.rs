//! Size Estimation Module
//!
//! Injectable estimators for the bytes a cached value occupies. Estimates are
//! approximate: they drive the memory eviction policy, not exact accounting.

use serde::Serialize;

/// Fallback estimate for values that cannot be serialized.
pub const FALLBACK_SIZE: usize = 1024;

// == Size Estimator Trait ==
/// Estimates the in-memory size of a cached value in bytes.
pub trait SizeEstimator<T>: Send + Sync {
    fn estimate(&self, value: &T) -> usize;
}

// == Serde Estimator ==
/// Default estimator: JSON-serialized length times two (a UTF-16-style
/// estimate, matching two bytes per character). Values that fail to
/// serialize get [`FALLBACK_SIZE`]; the failure is never surfaced.
#[derive(Debug, Default, Clone)]
pub struct SerdeEstimator;

impl<T: Serialize> SizeEstimator<T> for SerdeEstimator {
    fn estimate(&self, value: &T) -> usize {
        match serde_json::to_string(value) {
            Ok(json) => json.len() * 2,
            Err(_) => FALLBACK_SIZE,
        }
    }
}

// == Fixed Estimator ==
/// Flat per-entry estimate for values with no cheap structural measure.
#[derive(Debug, Clone)]
pub struct FixedEstimator {
    size: usize,
}

impl FixedEstimator {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Default for FixedEstimator {
    fn default() -> Self {
        Self {
            size: FALLBACK_SIZE,
        }
    }
}

impl<T> SizeEstimator<T> for FixedEstimator {
    fn estimate(&self, _value: &T) -> usize {
        self.size
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_estimator_string() {
        let est = SerdeEstimator;
        // "abcd" serializes to "\"abcd\"" (6 chars) -> 12 bytes
        assert_eq!(est.estimate(&"abcd".to_string()), 12);
    }

    #[test]
    fn test_serde_estimator_struct() {
        #[derive(Serialize)]
        struct Payload {
            id: u32,
        }

        let est = SerdeEstimator;
        let size = est.estimate(&Payload { id: 7 });
        assert_eq!(size, r#"{"id":7}"#.len() * 2);
    }

    #[test]
    fn test_fixed_estimator() {
        let est = FixedEstimator::new(64);
        assert_eq!(SizeEstimator::<String>::estimate(&est, &"x".to_string()), 64);

        let default = FixedEstimator::default();
        assert_eq!(SizeEstimator::<u8>::estimate(&default, &0), FALLBACK_SIZE);
    }
}
