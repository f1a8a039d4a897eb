use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// All simulation quantities (timers, positions, speeds, progress ratios)
/// use this type so that identical inputs produce identical state on every
/// platform.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in the sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in the sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Deterministic fixed-point square root via Newton's method.
///
/// Returns 0 for non-positive inputs. Converges well within the iteration
/// bound for the magnitudes a kitchen floor plan produces.
pub fn sqrt_fixed(v: Fixed64) -> Fixed64 {
    if v <= Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    let one = Fixed64::from_num(1);
    let two = Fixed64::from_num(2);
    let mut x = if v >= one { v } else { one };
    for _ in 0..32 {
        let next = (x + v / x) / two;
        if next == x {
            break;
        }
        x = next;
    }
    x
}
