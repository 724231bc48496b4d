/// Classification for retry policy.
///
/// Used by the reconciliation engine to decide how a failed fetch is reported.
///
/// # Behavior Summary
///
/// | Class | Retried within pass? | Retried on next pass? | Operator attention? |
/// |-------|----------------------|-----------------------|---------------------|
/// | `NextPass` | No | Yes (the gap persists) | Only if it keeps failing |
/// | `Never` | No | Yes, but will fail again | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Transient failure: network, timeout, rate limit, non-success HTTP status.
    ///
    /// The date stays a gap in the store, so the next reconciliation pass
    /// picks it up again without any bookkeeping.
    NextPass,

    /// Stable failure: the upstream payload no longer matches the expected
    /// shape, or the request itself is unsupported.
    ///
    /// Retrying inside the same pass cannot help. The failure is surfaced
    /// so that an operator can look at the upstream schema.
    Never,
}
