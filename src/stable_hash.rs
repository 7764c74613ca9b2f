//! Deterministic per-truck seeding.
//!
//! Every twin owns its own RNG, seeded from its truck identifier, so a run is
//! reproducible and one truck's draws never shift another's. Not cryptographic.

/// Domain salt mixed into truck seeds ("TWIN").
pub const TRUCK_SEED_SALT: u64 = 0x5457_494E;

/// Stable 64-bit hash of `s` under `seed`.
///
/// FNV-1a over the bytes, then a SplitMix64 finalizer for bit diffusion. The output is
/// identical across platforms and releases, unlike `std::hash`.
#[must_use]
pub fn stable_hash64(seed: u64, s: &str) -> u64 {
    let h = s.as_bytes().iter().fold(0xCBF2_9CE4_8422_2325u64, |h, b| {
        (h ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01B3)
    });
    splitmix64(seed ^ h)
}

/// RNG seed for the twin of `truck_id`.
#[must_use]
pub fn truck_seed(truck_id: &str) -> u64 {
    stable_hash64(TRUCK_SEED_SALT, truck_id)
}

#[inline]
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
