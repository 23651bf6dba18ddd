//! C ABI wrapper for the Brookside engine.
//!
//! The host owns the audio device and pulls samples; the engine runs on an
//! in-process sink whose clock advances with every rendered frame.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handle type: `BrooksideEngine` (heap-allocated; you own/delete it).
//! - Every function accepts a null handle and does nothing.
//!
//! Threading
//! - The object is NOT thread-safe; call all functions from the same thread.
//!   Lifecycle calls and rendering may be interleaved freely on that thread.

use brookside_engine::{LocalSink, NatureEngine};

/// Opaque engine handle.
pub struct BrooksideEngine {
    inner: NatureEngine<LocalSink>,
}

// --- Creation / destruction -------------------------------------------------------

/// Create a suspended engine. The same `seed` always yields the same soundscape.
#[no_mangle]
pub extern "C" fn brookside_create(sample_rate: f32, seed: u64) -> *mut BrooksideEngine {
    let sr = if sample_rate.is_finite() { sample_rate.max(1.0) } else { 48_000.0 };
    let inner = NatureEngine::with_seed(LocalSink::new(sr), seed);
    Box::into_raw(Box::new(BrooksideEngine { inner }))
}

/// Destroy an engine previously returned by `brookside_create`. Disposes it first.
#[no_mangle]
pub extern "C" fn brookside_destroy(engine: *mut BrooksideEngine) {
    if !engine.is_null() {
        unsafe { drop(Box::from_raw(engine)); }
    }
}

fn with_engine<T>(engine: *mut BrooksideEngine, default: T, f: impl FnOnce(&mut NatureEngine<LocalSink>) -> T) -> T {
    if engine.is_null() {
        return default;
    }
    let e = unsafe { &mut *engine };
    f(&mut e.inner)
}

// --- Lifecycle --------------------------------------------------------------------

/// Fade the soundscape in. Idempotent.
#[no_mangle]
pub extern "C" fn brookside_start(engine: *mut BrooksideEngine) {
    with_engine(engine, (), |e| e.start());
}

/// Fade the soundscape out over 2.2 s. No-op when not running.
#[no_mangle]
pub extern "C" fn brookside_stop(engine: *mut BrooksideEngine) {
    with_engine(engine, (), |e| e.stop());
}

/// Tear the graph down. The engine stays silent afterwards; destroy it when done.
#[no_mangle]
pub extern "C" fn brookside_dispose(engine: *mut BrooksideEngine) {
    with_engine(engine, (), |e| e.dispose());
}

/// 1 while running, 0 otherwise.
#[no_mangle]
pub extern "C" fn brookside_is_running(engine: *mut BrooksideEngine) -> i32 {
    with_engine(engine, 0, |e| i32::from(e.is_running()))
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` of audio into an interleaved f32 buffer with `channels`
/// channels, then fire any timers that came due.
///
/// Mono gets the average of left and right; channels beyond two repeat it.
/// Returns the number of frames rendered (0 on error).
#[no_mangle]
pub extern "C" fn brookside_render_interleaved_f32(
    engine: *mut BrooksideEngine,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    if out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    with_engine(engine, 0, |e| {
        let ch = channels as usize;
        let out = unsafe { std::slice::from_raw_parts_mut(out_interleaved, frames as usize * ch) };
        let n = e.sink_mut().render_interleaved(out, ch);
        e.poll();
        n as u32
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_ignored() {
        let null = std::ptr::null_mut();
        brookside_start(null);
        brookside_stop(null);
        brookside_dispose(null);
        brookside_destroy(null);
        assert_eq!(brookside_is_running(null), 0);
        let mut buf = [0.0_f32; 8];
        assert_eq!(brookside_render_interleaved_f32(null, buf.as_mut_ptr(), 4, 2), 0);
    }

    #[test]
    fn lifecycle_round_trip() {
        let e = brookside_create(8000.0, 3);
        assert_eq!(brookside_is_running(e), 0);

        let mut buf = vec![0.0_f32; 800 * 2];
        assert_eq!(brookside_render_interleaved_f32(e, buf.as_mut_ptr(), 800, 2), 800);
        assert!(buf.iter().all(|&x| x == 0.0));

        brookside_start(e);
        assert_eq!(brookside_is_running(e), 1);
        for _ in 0..20 {
            brookside_render_interleaved_f32(e, buf.as_mut_ptr(), 800, 2);
        }
        assert!(buf.iter().any(|&x| x != 0.0));

        brookside_stop(e);
        assert_eq!(brookside_is_running(e), 0);
        brookside_dispose(e);
        brookside_dispose(e);
        brookside_start(e);
        assert_eq!(brookside_is_running(e), 0);
        brookside_destroy(e);
    }

    #[test]
    fn mono_render() {
        let e = brookside_create(8000.0, 1);
        brookside_start(e);
        let mut buf = vec![0.0_f32; 4000];
        assert_eq!(brookside_render_interleaved_f32(e, buf.as_mut_ptr(), 4000, 1), 4000);
        assert!(buf.iter().any(|&x| x != 0.0));
        brookside_destroy(e);
    }
}
