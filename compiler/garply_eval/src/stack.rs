//! Stack safety for nested evaluation.
//!
//! `EvaluateExpression` re-enters the evaluator, so a chain of expressions
//! that evaluate expressions recurses on the native stack. On WASM targets,
//! where `stacker` isn't available, the closure is called directly.

/// Run `f`, growing the native stack first if it is running low.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
