//! Clock abstraction providing the timing primitives required by the
//! transport deadlines, the bulk transfer engine, and the pollers.

/// Monotonic millisecond clock with a bounded-sleep primitive.
///
/// `now_ms` wraps freely; all deadline arithmetic in the library uses
/// wrapping subtraction, so implementations need not avoid the wrap.
/// `delay_ms` may overshoot.
pub trait Clock {
    /// Monotonic milliseconds since an arbitrary origin.
    fn now_ms(&mut self) -> u32;

    /// Wait at least `millis` milliseconds.
    fn delay_ms(&mut self, millis: u32) -> impl core::future::Future<Output = ()>;
}
