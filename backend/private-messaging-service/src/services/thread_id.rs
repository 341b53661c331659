//! Thread identity for a pair of users.
//!
//! A thread id is `"{min}-{max}"` of the two participant ids, so both
//! participants resolve to the same key regardless of who sent first.

use crate::error::{AppError, AppResult};

pub fn resolve_thread_id(user_a: i64, user_b: i64) -> AppResult<String> {
    if user_a <= 0 || user_b <= 0 {
        return Err(AppError::validation("user ids must be positive"));
    }
    if user_a == user_b {
        return Err(AppError::validation(
            "a thread needs two distinct participants",
        ));
    }
    Ok(format!("{}-{}", user_a.min(user_b), user_a.max(user_b)))
}

/// Parse a canonical thread id back into its `(min, max)` participants.
pub fn parse_thread_id(thread_id: &str) -> Option<(i64, i64)> {
    let (lo, hi) = thread_id.split_once('-')?;
    let lo: i64 = lo.parse().ok()?;
    let hi: i64 = hi.parse().ok()?;
    if lo <= 0 || hi <= lo {
        return None;
    }
    // Reject non-canonical spellings such as "01-2" or "+1-2".
    if format!("{lo}-{hi}") != thread_id {
        return None;
    }
    Some((lo, hi))
}

/// The other participant of `thread_id` from `viewer`'s point of view.
///
/// A viewer outside the thread gets `NotFound`, the same answer as for a
/// thread that has no messages.
pub fn thread_partner(thread_id: &str, viewer: i64) -> AppResult<i64> {
    let (lo, hi) = parse_thread_id(thread_id)
        .ok_or_else(|| AppError::validation(format!("invalid thread id: {thread_id}")))?;
    match viewer {
        v if v == lo => Ok(hi),
        v if v == hi => Ok(lo),
        _ => Err(AppError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_for_both_orders() {
        assert_eq!(resolve_thread_id(42, 7).unwrap(), "7-42");
        assert_eq!(resolve_thread_id(7, 42).unwrap(), "7-42");
    }

    #[test]
    fn rejects_self_and_non_positive_ids() {
        assert!(matches!(resolve_thread_id(5, 5), Err(AppError::Validation(_))));
        assert!(matches!(resolve_thread_id(0, 5), Err(AppError::Validation(_))));
        assert!(matches!(resolve_thread_id(5, -1), Err(AppError::Validation(_))));
    }

    #[test]
    fn parse_accepts_only_canonical_form() {
        assert_eq!(parse_thread_id("7-42"), Some((7, 42)));
        assert_eq!(parse_thread_id("42-7"), None);
        assert_eq!(parse_thread_id("07-42"), None);
        assert_eq!(parse_thread_id("7-7"), None);
        assert_eq!(parse_thread_id("abc"), None);
        assert_eq!(parse_thread_id("0-3"), None);
    }

    #[test]
    fn partner_lookup() {
        assert_eq!(thread_partner("7-42", 7).unwrap(), 42);
        assert_eq!(thread_partner("7-42", 42).unwrap(), 7);
        assert!(matches!(thread_partner("7-42", 9), Err(AppError::NotFound)));
        assert!(matches!(
            thread_partner("nonsense", 7),
            Err(AppError::Validation(_))
        ));
    }
}
