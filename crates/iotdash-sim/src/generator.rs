//! Value Generators
//!
//! Stateless random sample producers used by the entity factories and the
//! simulation step. Every function takes the RNG explicitly so stores can
//! run on a seeded generator.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Fixed domain bounds for device metrics. The simulation step clamps every
/// random walk into these ranges.
pub mod bounds {
    pub const CPU: (f64, f64) = (10.0, 95.0);
    pub const MEMORY: (f64, f64) = (20.0, 90.0);
    pub const TEMPERATURE: (f64, f64) = (20.0, 75.0);
    pub const SIGNAL: (i32, i32) = (-90, -30);
    pub const UPTIME_HOURS: (u32, u32) = (1, 720);
}

/// Uniform integer in `[min, max]`.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    if min >= max {
        return min;
    }
    rng.random_range(min..=max)
}

/// Uniform float in `[min, max]` rounded to `decimals` places.
pub fn random_float<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, decimals: u32) -> f64 {
    let raw = rng.random::<f64>() * (max - min) + min;
    round_to(raw, decimals)
}

/// Uniformly chosen element; `None` only for an empty slice.
pub fn random_choice<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    items.choose(rng)
}

/// Bernoulli draw that accepts any `p`: values at or below 0 never fire,
/// values at or above 1 always fire.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.random::<f64>() < p
}

/// Colon separated, upper-case, six octet MAC address.
pub fn random_mac<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: Vec<String> = (0..6)
        .map(|_| format!("{:02X}", rng.random::<u8>()))
        .collect();
    octets.join(":")
}

/// Address in `192.168.{1-10}.{1-254}`.
pub fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "192.168.{}.{}",
        rng.random_range(1..=10u8),
        rng.random_range(1..=254u8)
    )
}

/// Human label for an elapsed number of minutes.
///
/// Bands: under a minute is "ahora", under an hour whole minutes, under a
/// day whole hours, otherwise whole days. Hours and days are pluralized.
pub fn relative_time_label(minutes: f64) -> String {
    if minutes < 1.0 {
        return "ahora".to_string();
    }
    if minutes < 60.0 {
        return format!("{} min", minutes.floor() as u64);
    }
    if minutes < 1440.0 {
        let hours = (minutes / 60.0).floor() as u64;
        return format!("{} hora{}", hours, if hours > 1 { "s" } else { "" });
    }
    let days = (minutes / 1440.0).floor() as u64;
    format!("{} día{}", days, if days > 1 { "s" } else { "" })
}

/// Add a uniform delta from `[-step, step]` (one decimal) and clip into `bounds`.
pub fn clamped_walk<R: Rng + ?Sized>(rng: &mut R, value: f64, step: f64, bounds: (f64, f64)) -> f64 {
    let next = value + random_float(rng, -step, step, 1);
    round_to(next.clamp(bounds.0, bounds.1), 1)
}

/// Integer variant of [`clamped_walk`].
pub fn clamped_walk_int<R: Rng + ?Sized>(rng: &mut R, value: i32, step: i32, bounds: (i32, i32)) -> i32 {
    let delta = random_int(rng, -(step as i64), step as i64) as i32;
    (value + delta).clamp(bounds.0, bounds.1)
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
