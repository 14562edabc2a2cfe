use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use lru::LruCache;

use crate::config::ExpressionConfig;
use crate::error::Result;
use crate::expression::Expression;

type CacheKey = (String, ExpressionConfig);

/// Bounded cache of compiled expressions, keyed by formula text and config.
pub struct ExpressionCache {
    entries: Mutex<LruCache<CacheKey, Arc<Expression>>>,
}

impl ExpressionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached expression for `expression`, compiling and caching
    /// it on a miss. Expressions that fail to compile are not cached.
    pub fn get_or_parse(
        &self,
        expression: &str,
        config: ExpressionConfig,
    ) -> Result<Arc<Expression>> {
        let compiled = Expression::with_config(expression, config);
        let key = (compiled.expression().to_string(), config);

        if let Some(hit) = self.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }

        // compile outside the lock
        compiled.parse()?;
        debug!("Caching compiled expression: {}", key.0);
        let compiled = Arc::new(compiled);
        self.lock().put(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<Expression>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
