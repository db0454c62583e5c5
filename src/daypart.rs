// 🕙 Daypart Window - Time-of-day containment with overnight wraparound
//
// Two shapes:
// - start <= end: same-day window, inclusive at both ends
// - start > end:  overnight window (e.g. 22:00-06:00), wraps past midnight
//
// A window with start == end takes the same-day branch, so it matches only
// at that exact minute.

use chrono::NaiveTime;

/// True when `now` falls inside the window spanned by `start` and `end`,
/// both ends inclusive.
///
/// An inverted pair is read as an overnight window: 22:00-06:00 covers
/// 22:00 through midnight and midnight through 06:00.
pub fn contains(start: NaiveTime, end: NaiveTime, now: NaiveTime) -> bool {
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_same_day_window() {
        let start = hm(9, 0);
        let end = hm(17, 0);

        assert!(contains(start, end, hm(12, 0)));
        assert!(!contains(start, end, hm(8, 59)));
        assert!(!contains(start, end, hm(17, 1)));
        assert!(!contains(start, end, hm(23, 0)));
    }

    #[test]
    fn test_same_day_window_inclusive_boundaries() {
        let start = hm(9, 0);
        let end = hm(17, 0);

        // Both ends count as inside
        assert!(contains(start, end, start));
        assert!(contains(start, end, end));
    }

    #[test]
    fn test_overnight_window() {
        let start = hm(22, 0);
        let end = hm(6, 0);

        assert!(contains(start, end, hm(23, 0)));
        assert!(contains(start, end, hm(2, 30)));
        assert!(!contains(start, end, hm(12, 0)));
        assert!(!contains(start, end, hm(21, 59)));
        assert!(!contains(start, end, hm(6, 1)));
    }

    #[test]
    fn test_overnight_window_inclusive_boundaries() {
        let start = hm(22, 0);
        let end = hm(6, 0);

        assert!(contains(start, end, start));
        assert!(contains(start, end, end));
    }

    #[test]
    fn test_overnight_window_at_midnight() {
        let start = hm(22, 0);
        let end = hm(6, 0);

        assert!(contains(start, end, hm(0, 0)));
        assert!(contains(start, end, hm(23, 59)));
    }

    #[test]
    fn test_degenerate_equal_window() {
        // start == end takes the same-day branch: only that minute matches
        let at = hm(12, 0);

        assert!(contains(at, at, hm(12, 0)));
        assert!(!contains(at, at, hm(12, 1)));
        assert!(!contains(at, at, hm(11, 59)));
    }

    #[test]
    fn test_minute_precision() {
        let start = hm(9, 30);
        let end = hm(10, 15);

        assert!(contains(start, end, hm(9, 30)));
        assert!(contains(start, end, hm(10, 15)));
        assert!(!contains(start, end, hm(9, 29)));
        assert!(!contains(start, end, hm(10, 16)));
    }
}
