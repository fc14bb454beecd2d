use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::future::Future;

use crate::checkout::error::CheckoutError;

/// Attempts before a code collision is surfaced as an error.
pub const MAX_ATTEMPTS: usize = 5;

/// Produces "ORD-<8-digit-time-derived>-<4-char-random>". Uniqueness is the
/// job of the unique column plus the retry in [`with_unique_code`].
pub fn generate() -> String {
    let time_part = Utc::now().timestamp() % 100_000_000;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{:08}-{}", time_part, suffix)
}

/// Drives `attempt` with fresh codes until one is accepted. `Ok(None)` from
/// the attempt means the code collided and a new one should be tried,
/// bounded by [`MAX_ATTEMPTS`].
pub async fn with_unique_code<T, F, Fut>(mut attempt: F) -> Result<T, CheckoutError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<T>, CheckoutError>>,
{
    for _ in 0..MAX_ATTEMPTS {
        if let Some(value) = attempt(generate()).await? {
            return Ok(value);
        }
    }
    Err(CheckoutError::DuplicateIdentifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn code_has_expected_shape() {
        let code = generate();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn ten_thousand_codes_stay_distinct() {
        let mut seen: HashSet<String> = HashSet::new();
        for _ in 0..10_000 {
            let code = with_unique_code(|candidate| {
                let fresh = !seen.contains(&candidate);
                async move { Ok(if fresh { Some(candidate) } else { None }) }
            })
            .await
            .unwrap();
            assert!(seen.insert(code));
        }
        assert_eq!(seen.len(), 10_000);
    }

    #[tokio::test]
    async fn collisions_are_retried_with_fresh_codes() {
        let mut offered: Vec<String> = Vec::new();
        let accepted = with_unique_code(|candidate| {
            offered.push(candidate.clone());
            let accept = offered.len() == 3;
            async move { Ok(if accept { Some(candidate) } else { None }) }
        })
        .await
        .unwrap();
        assert_eq!(offered.len(), 3);
        assert_eq!(offered[2], accepted);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let mut calls = 0;
        let result = with_unique_code(|_| {
            calls += 1;
            async { Ok::<Option<String>, CheckoutError>(None) }
        })
        .await;
        assert!(matches!(result, Err(CheckoutError::DuplicateIdentifier)));
        assert_eq!(calls, MAX_ATTEMPTS);
    }
}
