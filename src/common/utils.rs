//! Utility functions for warmgate

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp (milliseconds)
pub fn timestamp_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Split a slice into fixed-size chunks, last chunk possibly shorter
pub fn chunks<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    items.chunks(size).map(|c| c.to_vec()).collect()
}

/// Parse duration string (e.g., "500ms", "30s", "5m", "1h", "7d")
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty duration".into()));
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else {
        (&s[..s.len() - 1], &s[s.len() - 1..])
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {}", s)))?;

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num * 60),
        "h" => Duration::from_secs(num * 3600),
        "d" => Duration::from_secs(num * 86400),
        _ => {
            return Err(crate::Error::InvalidConfig(format!(
                "unknown duration unit: {}",
                unit
            )))
        }
    };

    Ok(duration)
}

/// Retry a fallible async operation a fixed number of times with a fixed
/// delay between attempts. Non-retryable errors fail immediately.
pub async fn retry_fixed<F, Fut, T>(mut f: F, attempts: usize, delay: Duration) -> crate::Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = crate::Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                attempt += 1;
                tracing::warn!("Attempt {} failed: {}, retrying in {:?}", attempt, e, delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_exact_batches() {
        let paths = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];
        let batches = chunks(&paths, 2);
        assert_eq!(batches, vec![vec!["/a", "/b"], vec!["/c"]]);
    }

    #[test]
    fn test_chunks_counts() {
        // ceil(n / size) batches
        assert_eq!(chunks(&[1, 2, 3, 4, 5, 6], 6).len(), 1);
        assert_eq!(chunks(&[1, 2, 3, 4, 5, 6, 7], 6).len(), 2);
        assert_eq!(chunks::<u32>(&[], 6).len(), 0);
    }

    #[test]
    fn test_chunks_zero_size_clamped() {
        assert_eq!(chunks(&[1, 2], 0), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604800));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[tokio::test]
    async fn test_retry_fixed_recovers() {
        let mut calls = 0;
        let result = retry_fixed(
            || {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 3 {
                        Err(crate::Error::Origin("transient".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_fixed_exhausts() {
        let result: crate::Result<()> = retry_fixed(
            || async { Err(crate::Error::Origin("down".into())) },
            3,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_retry_fixed_non_retryable_fails_fast() {
        let mut calls = 0;
        let result: crate::Result<()> = retry_fixed(
            || {
                calls += 1;
                async { Err(crate::Error::InvalidRequest("bad".into())) }
            },
            5,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
