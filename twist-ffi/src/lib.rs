//! C ABI wrapper for the Twist oscillator.
//!
//! One opaque `TwistVoice` per note-playing voice: create it for the host's
//! rate, push controls and the gate, `twist_initialize` on note-on, then render
//! planar stereo blocks.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - `TwistVoice` is heap-allocated; release it with `twist_destroy`.
//! - Null handles and null buffers are ignored (functions return 0/false).
//!
//! Threading
//! - A voice is NOT thread-safe; drive it from the audio thread only.

use std::os::raw::c_char;

use twist_engine::{engine_name, Controls, PipelineConfig, TwistOscillator, ENGINE_NAMES};

/// Opaque voice handle.
pub struct TwistVoice {
    osc: TwistOscillator,
}

/// Control snapshot as seen from C.
///
/// `harmonics`, `timbre`, `morph` are bipolar; the rest unipolar. The low-pass
/// gate is active only when `lpg_enabled` is set.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct TwistControls {
    pub engine: i32,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    pub aux_mix: f32,
    pub lpg_response: f32,
    pub lpg_enabled: bool,
    pub lpg_decay: f32,
    pub retrigger: bool,
}

impl From<&TwistControls> for Controls {
    fn from(c: &TwistControls) -> Self {
        Controls {
            engine: c.engine,
            harmonics: c.harmonics,
            timbre: c.timbre,
            morph: c.morph,
            aux_mix: c.aux_mix,
            lpg_response: c.lpg_enabled.then_some(c.lpg_response),
            lpg_decay: c.lpg_decay,
            retrigger: c.retrigger,
        }
    }
}

#[inline]
fn voice<'a>(v: *mut TwistVoice) -> Option<&'a mut TwistVoice> {
    // handles come from `twist_create` and are used from one thread
    unsafe { v.as_mut() }
}

// --- Creation / destruction -------------------------------------------------------

/// Create a voice rendering at `target_rate` Hz.
/// Returns null if the engine's working memory cannot be set up. A voice whose
/// rate is unusable is still returned but stays silent (see `twist_is_degraded`).
#[no_mangle]
pub extern "C" fn twist_create(target_rate: f64) -> *mut TwistVoice {
    match TwistOscillator::new(PipelineConfig::with_target_rate(target_rate)) {
        Ok(osc) => Box::into_raw(Box::new(TwistVoice { osc })),
        Err(e) => {
            log::error!("twist_create failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Destroy a voice previously returned by `twist_create`.
#[no_mangle]
pub extern "C" fn twist_destroy(voice: *mut TwistVoice) {
    if !voice.is_null() {
        unsafe { drop(Box::from_raw(voice)) };
    }
}

#[no_mangle]
pub extern "C" fn twist_is_degraded(v: *mut TwistVoice) -> bool {
    voice(v).map_or(true, |v| v.osc.is_degraded())
}

// --- Note control ----------------------------------------------------------------

/// Start a note. Returns false when the voice is degraded (nothing happens).
#[no_mangle]
pub extern "C" fn twist_initialize(v: *mut TwistVoice, pitch: f32, is_display: bool, nonzero_drift: bool) -> bool {
    voice(v).is_some_and(|v| v.osc.initialize(pitch, is_display, nonzero_drift).is_some())
}

#[no_mangle]
pub extern "C" fn twist_set_gate(v: *mut TwistVoice, gate: bool) {
    if let Some(v) = voice(v) {
        v.osc.set_gate(gate);
    }
}

#[no_mangle]
pub extern "C" fn twist_set_controls(v: *mut TwistVoice, controls: *const TwistControls) {
    let (Some(v), Some(c)) = (voice(v), unsafe { controls.as_ref() }) else { return };
    v.osc.set_controls(&Controls::from(c));
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` frames into planar `left`/`right` buffers.
/// Returns the number of frames rendered (0 on bad arguments or a degraded voice).
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn twist_render_stereo(
    v: *mut TwistVoice,
    pitch: f32,
    drift: f32,
    stereo: bool,
    fm: bool,
    fm_depth: f32,
    left: *mut f32,
    right: *mut f32,
    frames: u32,
) -> u32 {
    let Some(v) = voice(v) else { return 0 };
    if left.is_null() || right.is_null() || frames == 0 {
        return 0;
    }
    let n = frames as usize;
    let (l, r) = unsafe { (std::slice::from_raw_parts_mut(left, n), std::slice::from_raw_parts_mut(right, n)) };
    v.osc.process_block(pitch, drift, stereo, fm, fm_depth, l, r) as u32
}

// --- Catalog ---------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn twist_engine_count() -> i32 {
    ENGINE_NAMES.len() as i32
}

/// Copy the NUL-terminated name of engine `index` into `buf` (truncated to
/// `len - 1` bytes). Returns the full name length in bytes, without the NUL.
#[no_mangle]
pub extern "C" fn twist_engine_name(index: i32, buf: *mut c_char, len: usize) -> usize {
    let name = engine_name(index);
    let bytes = name.as_bytes();
    if !buf.is_null() && len > 0 {
        let n = bytes.len().min(len - 1);
        let out = unsafe { std::slice::from_raw_parts_mut(buf.cast::<u8>(), len) };
        out[..n].copy_from_slice(&bytes[..n]);
        out[n] = 0;
    }
    bytes.len()
}

// ------------------------------------ Tests --------------------------------------
