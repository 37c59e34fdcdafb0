use std::sync::OnceLock;
use std::time::{Duration, Instant};

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Process-wide start of the monotonic clock.
pub fn anchor() -> Instant {
    *ANCHOR.get_or_init(Instant::now)
}

/// Value returned by `now_monotonic()`: low 32 bits of the whole seconds in the upper
/// half, low 32 bits of the nanosecond remainder in the lower half.
pub fn now_monotonic() -> i64 {
    pack(anchor().elapsed())
}

pub fn pack(elapsed: Duration) -> i64 {
    let seconds = elapsed.as_secs() & 0xffff_ffff;
    let nanos = u64::from(elapsed.subsec_nanos()) & 0xffff_ffff;

    ((seconds << 32) | nanos) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn packs_seconds_above_nanos() {
        assert_eq!(pack(Duration::new(0, 0)), 0);
        assert_eq!(pack(Duration::new(1, 5)), (1 << 32) | 5);
        assert_eq!(pack(Duration::new(3, 999_999_999)), (3 << 32) | 999_999_999);
    }

    #[test]
    fn seconds_wrap_at_32_bits() {
        assert_eq!(pack(Duration::new(1 << 32, 7)), 7);
        assert_eq!(pack(Duration::new((1 << 32) + 2, 0)), 2 << 32);
    }

    #[test]
    fn packing_preserves_order() {
        let earlier = pack(Duration::new(4, 999_999_999));
        let later = pack(Duration::new(5, 0));

        assert!(later > earlier);
    }

    #[test]
    fn sequential_reads_never_decrease() {
        let conn = Connection::open_in_memory().unwrap();
        crate::functions::register_functions(&conn).unwrap();

        let mut last: i64 = conn
            .query_row("SELECT now_monotonic()", [], |row| row.get(0))
            .unwrap();
        for _ in 0..100 {
            let next: i64 = conn
                .query_row("SELECT now_monotonic()", [], |row| row.get(0))
                .unwrap();
            assert!(next >= last);
            last = next;
        }
    }
}
