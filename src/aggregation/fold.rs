use crate::upstream::TagSamples;

/// Parses one upstream sample; sentinels and malformed values count as zero.
///
/// Values outside the `i64` range are malformed too. Bucket and window totals
/// saturate at the `i64` bounds instead of wrapping.
pub fn coerce_sample(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFold {
    pub series: Vec<i64>,
    pub sum: i64,
}

/// Sums same-index samples across all tags of one window.
///
/// Tags are always added together, never averaged, including when several raw
/// tags stand behind the total meter. Samples past `bucket_count` are dropped so
/// that `sum` always equals the sum of `series`.
pub fn fold(tag_arrays: &[TagSamples], bucket_count: usize) -> WindowFold {
    let mut series = vec![0i64; bucket_count];
    let mut sum = 0i64;

    for tag in tag_arrays {
        for (bucket, raw) in series.iter_mut().zip(&tag.values) {
            let value = coerce_sample(raw);
            *bucket = bucket.saturating_add(value);
            sum = sum.saturating_add(value);
        }
    }

    WindowFold { series, sum }
}
