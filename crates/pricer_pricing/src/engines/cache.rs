//! Memoised engine results.
//!
//! A [`CachedEngine`] keeps the last result of its engine together with the
//! version stamps it was computed from: the instrument handle, the engine's
//! own inputs and the pricing context. A call with the same stamps returns
//! the stored result; any relink produces a new stamp and a recomputation.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use pricer_core::market_data::handle::Handle;

use super::PricingEngine;
use crate::context::{ContextStamp, PricingContext};
use crate::mc::McError;
use crate::results::PricingResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    instrument: u64,
    engine: u64,
    context: ContextStamp,
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    result: Arc<PricingResult>,
}

/// Engine wrapper memoising the latest result against input versions.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use pricer_core::market_data::handle::Handle;
/// use pricer_core::types::{Date, DayCountConvention};
/// use pricer_models::instruments::{CliquetKind, CliquetOption, OptionType};
/// use pricer_models::models::{BlackScholesProcess, ProcessEnum};
/// use pricer_pricing::context::PricingContext;
/// use pricer_pricing::engines::{CachedEngine, MonteCarloCliquetEngine};
/// use pricer_pricing::mc::MonteCarloConfig;
///
/// let today = Date::from_ymd(2024, 1, 1).unwrap();
/// let mut ctx = PricingContext::flat(today, DayCountConvention::Act365Fixed, 0.03);
/// let option = Handle::new(
///     CliquetOption::new(
///         CliquetKind::Cliquet,
///         OptionType::Call,
///         1.0,
///         vec![today.add_days(7), today.add_days(182)],
///         today.add_days(365),
///     )
///     .unwrap(),
/// );
/// let process: ProcessEnum = BlackScholesProcess::new(100.0, 0.03, 0.0, 0.2).unwrap().into();
/// let config = MonteCarloConfig::builder().required_samples(1024).seed(1).build().unwrap();
/// let engine = CachedEngine::new(MonteCarloCliquetEngine::new(Handle::new(process), config).unwrap());
///
/// let first = engine.calculate(&option, &ctx).unwrap();
/// assert!(Arc::ptr_eq(&first, &engine.calculate(&option, &ctx).unwrap()));
///
/// ctx.set_valuation_date(today.add_days(1));
/// assert!(!Arc::ptr_eq(&first, &engine.calculate(&option, &ctx).unwrap()));
/// ```
#[derive(Debug)]
pub struct CachedEngine<E> {
    engine: E,
    entry: Mutex<Option<CacheEntry>>,
}

impl<E: PricingEngine> CachedEngine<E> {
    /// Wraps `engine` with an empty cache.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            entry: Mutex::new(None),
        }
    }

    /// The wrapped engine.
    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the wrapped engine. Relinking its inputs bumps
    /// [`PricingEngine::version`], so stale entries are never served.
    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Returns the memoised result when all input stamps match, otherwise
    /// prices and stores the new result.
    ///
    /// Errors are not cached.
    pub fn calculate(
        &self,
        instrument: &Handle<E::Instrument>,
        context: &PricingContext,
    ) -> Result<Arc<PricingResult>, McError> {
        let key = CacheKey {
            instrument: instrument.version(),
            engine: self.engine.version(),
            context: context.stamp(),
        };
        if let Some(entry) = self.lock().as_ref().filter(|e| e.key == key) {
            trace!(instrument = key.instrument, "Serving cached result");
            return Ok(Arc::clone(&entry.result));
        }
        self.compute(key, instrument, context)
    }

    /// Prices unconditionally and replaces the stored result.
    pub fn recompute(
        &self,
        instrument: &Handle<E::Instrument>,
        context: &PricingContext,
    ) -> Result<Arc<PricingResult>, McError> {
        let key = CacheKey {
            instrument: instrument.version(),
            engine: self.engine.version(),
            context: context.stamp(),
        };
        self.compute(key, instrument, context)
    }

    /// Drops the stored result.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    /// Whether a result is stored.
    pub fn is_cached(&self) -> bool {
        self.lock().is_some()
    }

    fn compute(
        &self,
        key: CacheKey,
        instrument: &Handle<E::Instrument>,
        context: &PricingContext,
    ) -> Result<Arc<PricingResult>, McError> {
        let result = Arc::new(self.engine.calculate(instrument.current(), context)?);
        *self.lock() = Some(CacheEntry {
            key,
            result: Arc::clone(&result),
        });
        Ok(result)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CacheEntry>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::{Date, DayCountConvention};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and prices every instrument at its own value.
    struct CountingEngine {
        calls: AtomicUsize,
        version: u64,
    }

    impl PricingEngine for CountingEngine {
        type Instrument = f64;

        fn calculate(&self, instrument: &f64, _: &PricingContext) -> Result<PricingResult, McError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if instrument.is_nan() {
                return Err(McError::InvalidInput("nan".to_string()));
            }
            Ok(PricingResult::new(*instrument, None, 1))
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    fn cached() -> CachedEngine<CountingEngine> {
        CachedEngine::new(CountingEngine {
            calls: AtomicUsize::new(0),
            version: 1,
        })
    }

    fn ctx() -> PricingContext {
        PricingContext::flat(
            Date::from_ymd(2024, 6, 3).unwrap(),
            DayCountConvention::Act365Fixed,
            0.02,
        )
    }

    fn calls(engine: &CachedEngine<CountingEngine>) -> usize {
        engine.engine().calls.load(Ordering::SeqCst)
    }

    #[test]
    fn test_same_stamps_hit_cache() {
        let engine = cached();
        let instrument = Handle::new(3.0);
        let context = ctx();
        let a = engine.calculate(&instrument, &context).unwrap();
        let b = engine.calculate(&instrument.clone(), &context.clone()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls(&engine), 1);
    }

    #[test]
    fn test_relinks_trigger_recomputation() {
        let mut engine = cached();
        let mut instrument = Handle::new(3.0);
        let mut context = ctx();
        engine.calculate(&instrument, &context).unwrap();

        instrument.relink(4.0);
        assert_eq!(engine.calculate(&instrument, &context).unwrap().value, 4.0);
        assert_eq!(calls(&engine), 2);

        context.relink_discount_curve(Arc::new(pricer_core::market_data::curves::FlatCurve::new(0.05)));
        engine.calculate(&instrument, &context).unwrap();
        assert_eq!(calls(&engine), 3);

        engine.engine_mut().version = 2;
        engine.calculate(&instrument, &context).unwrap();
        assert_eq!(calls(&engine), 4);
    }

    #[test]
    fn test_moved_valuation_date_reprices_cliquet() {
        use crate::engines::MonteCarloCliquetEngine;
        use crate::mc::MonteCarloConfig;
        use pricer_models::instruments::{CliquetKind, CliquetOption, OptionType};
        use pricer_models::models::{BlackScholesProcess, ProcessEnum};

        let today = Date::from_ymd(2024, 1, 1).unwrap();
        let mut context = PricingContext::flat(today, DayCountConvention::Act365Fixed, 0.03);
        let option = Handle::new(
            CliquetOption::new(
                CliquetKind::Cliquet,
                OptionType::Call,
                1.0,
                vec![today.add_days(7), today.add_days(182)],
                today.add_days(365),
            )
            .unwrap(),
        );
        let process: ProcessEnum = BlackScholesProcess::new(100.0, 0.03, 0.0, 0.2).unwrap().into();
        let config = MonteCarloConfig::builder().required_samples(512).seed(1).build().unwrap();
        let engine =
            CachedEngine::new(MonteCarloCliquetEngine::new(Handle::new(process), config).unwrap());

        let first = engine.calculate(&option, &context).unwrap();
        context.set_valuation_date(today.add_days(7));
        let moved = engine.calculate(&option, &context).unwrap();
        assert!(!Arc::ptr_eq(&first, &moved));
        assert!(moved.value > 0.0);
    }

    #[test]
    fn test_recompute_and_invalidate() {
        let engine = cached();
        let instrument = Handle::new(1.5);
        let context = ctx();
        let a = engine.calculate(&instrument, &context).unwrap();
        let b = engine.recompute(&instrument, &context).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);

        engine.invalidate();
        assert!(!engine.is_cached());
        engine.calculate(&instrument, &context).unwrap();
        assert_eq!(calls(&engine), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let engine = cached();
        let context = ctx();
        assert!(engine.calculate(&Handle::new(f64::NAN), &context).is_err());
        assert!(!engine.is_cached());
    }
}
