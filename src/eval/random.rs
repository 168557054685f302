use rand::Rng;

use crate::eval::parse::RandomCall;
use crate::model::Value;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const LETTERS_AND_DIGITS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

impl RandomCall {
    /// Draws a value from `rng`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match *self {
            RandomCall::Bool => Value::Int(random_bool(rng)),
            RandomCall::Chars(len) => Value::Text(random_chars(rng, len)),
            RandomCall::Int { low, high } => Value::Int(random_int(rng, low, high)),
            RandomCall::Decimal { low, high, scale } => {
                Value::Text(random_decimal(rng, low, high, scale))
            }
        }
    }
}

/// Orders the bounds, then rounds the lower one up and the upper one down.
///
/// Non-integral bounds therefore narrow the range.
pub fn normalize_range(a: f64, b: f64) -> (f64, f64) {
    let (low, high) = if a > b { (b, a) } else { (a, b) };
    (low.ceil(), high.floor())
}

pub fn random_bool<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    i64::from(rng.gen_bool(0.5))
}

/// `len` characters, the first one a letter.
pub fn random_chars<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|position| {
            let alphabet = if position == 0 { LETTERS } else { LETTERS_AND_DIGITS };
            alphabet[rng.gen_range(0..alphabet.len())] as char
        })
        .collect()
}

/// Integer in the inclusive normalized range. A range emptied by rounding
/// yields its lower bound.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> i64 {
    let (min, max) = normalize_range(a, b);
    let (min, max) = (min as i64, max as i64);
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Number in `[min, max)` of the normalized range, formatted with `scale`
/// decimals. A range that is empty or wider than `f64` can span yields its
/// lower bound.
pub fn random_decimal<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64, scale: usize) -> String {
    let (min, max) = normalize_range(a, b);
    let sampled = min < max && (max - min).is_finite();
    let value = if sampled { rng.gen_range(min..max) } else { min };
    format!("{value:.scale$}")
}
