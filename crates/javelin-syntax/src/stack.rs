/// Stack left when a recursive step switches to a fresh heap segment.
const RED_ZONE: usize = 128 * 1024;
/// Size of each heap segment.
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first moving onto a heap-allocated stack segment when less than
/// [`RED_ZONE`] bytes of the current stack remain.
///
/// The parser and the tree walks call this at every recursive entry point, so
/// deeply nested input cannot exhaust the caller's thread stack.
#[inline]
pub fn ensure_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}
