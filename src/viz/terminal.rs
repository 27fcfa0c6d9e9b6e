//! Text charts for the terminal
//!
//! Used by the `train` subcommand to show how held-out errors are spread.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::fmt::Write;

const SPARK_LEVELS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One-line sparkline of `values`, sampled down to at most `width` cells
#[must_use]
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let (min, max) = bounds(values);
    let range = max - min;
    let cells = width.min(values.len());
    let step = values.len() as f64 / cells as f64;

    (0..cells)
        .map(|i| {
            let v = values[((i as f64 * step) as usize).min(values.len() - 1)];
            let level = if range > 0.0 { (v - min) / range } else { 0.5 };
            let idx = (level * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[idx.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Horizontal bar histogram, one line per bin
///
/// Each line reads `start-end | bars count`. Empty input or zero bins yields
/// an empty string.
#[must_use]
pub fn histogram(values: &[f64], bins: usize, width: usize) -> String {
    if values.is_empty() || bins == 0 {
        return String::new();
    }
    let (min, max) = bounds(values);
    let bin_width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let bin = if bin_width > 0.0 {
            ((v - min) / bin_width).floor() as usize
        } else {
            0
        };
        counts[bin.min(bins - 1)] += 1;
    }

    let peak = counts.iter().copied().max().unwrap_or(1).max(1);
    let mut out = String::new();
    for (i, &count) in counts.iter().enumerate() {
        let start = min + i as f64 * bin_width;
        let bar = (count as f64 * width as f64 / peak as f64).round() as usize;
        let _ = writeln!(
            out,
            "{:>8.1}-{:<8.1} |{} {count}",
            start,
            start + bin_width,
            "█".repeat(bar)
        );
    }
    out
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
