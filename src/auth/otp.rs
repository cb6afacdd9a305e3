//! One-time recovery codes
//!
//! A recovery code substitutes for the password during reset, so it is drawn
//! from the OS random source rather than a general-purpose PRNG.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::Rng;

/// Validity window of a recovery code, in minutes.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Generate a 6-digit numeric one-time code, uniform over [100000, 999999].
pub fn generate_otp() -> String {
    OsRng.gen_range(100_000..=999_999u32).to_string()
}

/// Expiry timestamp for a code issued now.
pub fn otp_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(OTP_TTL_MINUTES)
}
