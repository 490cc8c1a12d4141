//! Denormal Protection
//!
//! Recursive filters decaying towards silence produce subnormal floats,
//! which are 10-100x slower on many CPUs. [`DenormalGuard`] sets the FPU
//! flush-to-zero mode for the duration of a block (x86/x86_64: FTZ + DAZ in
//! MXCSR, aarch64: FZ in FPCR). Other targets run without protection.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const MXCSR_FTZ: u32 = 0x8000;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const MXCSR_DAZ: u32 = 0x0040;

#[cfg(target_arch = "aarch64")]
const FPCR_FZ: u64 = 1 << 24;

/// Scoped flush-to-zero mode
///
/// Create one at the top of an audio callback; the previous floating-point
/// control state is restored when the guard drops.
///
/// ```
/// use merj_dsp::DenormalGuard;
///
/// let _guard = DenormalGuard::new();
/// // ... block processing with denormals flushed to zero ...
/// ```
#[must_use = "flush-to-zero is only active while the guard is alive"]
pub struct DenormalGuard {
    #[cfg_attr(
        not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")),
        allow(dead_code)
    )]
    saved: u64,
}

impl DenormalGuard {
    pub fn new() -> Self {
        let saved = enable_flush_to_zero();
        Self { saved }
    }
}

impl Default for DenormalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DenormalGuard {
    fn drop(&mut self) {
        restore_control_register(self.saved);
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(deprecated)]
fn enable_flush_to_zero() -> u64 {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{_mm_getcsr, _mm_setcsr};
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{_mm_getcsr, _mm_setcsr};

    // SAFETY: SSE is baseline on every target this crate builds for; only
    // the FTZ/DAZ bits are changed and the old value is restored on drop.
    unsafe {
        let csr = _mm_getcsr();
        _mm_setcsr(csr | MXCSR_FTZ | MXCSR_DAZ);
        u64::from(csr)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(deprecated)]
fn restore_control_register(saved: u64) {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::_mm_setcsr;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::_mm_setcsr;

    // SAFETY: writes back the exact value read in `enable_flush_to_zero`.
    unsafe { _mm_setcsr(saved as u32) }
}

#[cfg(target_arch = "aarch64")]
fn enable_flush_to_zero() -> u64 {
    let fpcr: u64;
    // SAFETY: reading and writing FPCR only changes floating-point modes.
    unsafe {
        core::arch::asm!("mrs {}, fpcr", out(reg) fpcr);
        core::arch::asm!("msr fpcr, {}", in(reg) fpcr | FPCR_FZ);
    }
    fpcr
}

#[cfg(target_arch = "aarch64")]
fn restore_control_register(saved: u64) {
    // SAFETY: writes back the exact value read in `enable_flush_to_zero`.
    unsafe { core::arch::asm!("msr fpcr, {}", in(reg) saved) }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn enable_flush_to_zero() -> u64 {
    0
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn restore_control_register(_saved: u64) {}
