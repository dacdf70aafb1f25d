//! Entropy estimate of food.

/// Tolerance against rounding noise when flooring.
const EPSILON: f64 = 1e-9;

/// Maximum entropy of a byte stream, in bits per byte.
const MAX_BITS: u32 = 8;

/// Shannon entropy of `data` in whole bits per byte, rounded down.
///
/// Returns `None` for empty input. The result is always in `0..=8`:
/// a single repeated byte scores `0`, every byte value equally often
/// scores `8`.
#[allow(clippy::cast_precision_loss)]
pub fn entropy_estimate(data: &[u8]) -> Option<u32> {
    if data.is_empty() {
        return None;
    }

    let mut histogram = [0_u64; 256];
    for &byte in data {
        if let Some(count) = histogram.get_mut(usize::from(byte)) {
            *count = count.saturating_add(1);
        }
    }

    let total = data.len() as f64;
    let entropy: f64 = histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    (0..=MAX_BITS)
        .rev()
        .find(|&bits| f64::from(bits) <= entropy + EPSILON)
        .or(Some(0))
}
