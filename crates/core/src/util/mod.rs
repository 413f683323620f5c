pub mod range;
pub mod unit;

/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, logs how long it took to evaluate, and returns the value of the
/// expression.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        $crate::timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Ease-out cubic curve, `1 - (1 - t)^3`. Input is clamped to `[0, 1]`, so
/// the output is always in `[0, 1]` and hits exactly `1.0` at `t = 1`.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = range::NumRange::<f64>::normal_range().clamp(t);
    1.0 - (1.0 - t).powi(3)
}

/// Map a coordinate onto a fixed-size degree grid, returning the integer
/// bucket it falls in. Used both for index acceleration and LOD clustering.
pub fn degree_bucket(value: f64, bucket_degrees: f64) -> i64 {
    (value / bucket_degrees).floor() as i64
}
