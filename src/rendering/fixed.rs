/// 16.16 fixed point helpers used by the light tables and slab stepping
pub type Fixed = i32;

pub const FRACBITS: u32 = 16;
pub const FRACUNIT: Fixed = 1 << FRACBITS;

#[inline]
pub fn float_to_fixed(value: f64) -> Fixed {
    (value * FRACUNIT as f64) as Fixed
}
