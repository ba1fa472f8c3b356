use crate::types::condition::Condition;

/// Trailing rolling conjunction over `window` days, current day included.
///
/// Positions without `window` days of history are `Unknown`; a window
/// containing an unknown day is `Unknown`; otherwise the window is `True`
/// only when every day is `True`. The result at `i` never looks past `i`.
pub fn rolling_all(daily: &[Condition], window: usize) -> Vec<Condition> {
    if window <= 1 {
        return daily.to_vec();
    }
    (0..daily.len())
        .map(|i| {
            if i + 1 < window {
                Condition::Unknown
            } else {
                Condition::all(daily[i + 1 - window..=i].iter().copied())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Condition::*;

    #[test]
    fn test_window_one_is_identity() {
        let daily = vec![False, True, Unknown];
        assert_eq!(rolling_all(&daily, 1), daily);
    }

    #[test]
    fn test_insufficient_history_is_unknown() {
        let daily = vec![True, True, True, True];
        assert_eq!(rolling_all(&daily, 3), vec![Unknown, Unknown, True, True]);
        assert_eq!(rolling_all(&daily, 10), vec![Unknown; 4]);
        assert!(rolling_all(&[], 3).is_empty());
    }

    #[test]
    fn test_unknown_spreads_over_window() {
        let daily = vec![True, Unknown, True, True, True, False];
        assert_eq!(
            rolling_all(&daily, 2),
            vec![Unknown, Unknown, Unknown, True, True, False]
        );
    }

    #[test]
    fn test_causality() {
        // Changing a future day never changes earlier results.
        let base = vec![True, True, False, True, True];
        let mut changed = base.clone();
        changed[4] = Unknown;
        let a = rolling_all(&base, 3);
        let b = rolling_all(&changed, 3);
        assert_eq!(a[..4], b[..4]);
        assert_ne!(a[4], b[4]);
    }
}
