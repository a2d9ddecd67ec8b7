//! Settings that share one configuration parameter.

/// Both broadcasts honoured.
pub const ALL_ON_ALL_OFF_BOTH: i64 = 255;
/// Only "all on" honoured.
pub const ALL_ON_ONLY: i64 = 2;
/// Only "all off" honoured.
pub const ALL_OFF_ONLY: i64 = 1;
/// Neither broadcast honoured.
pub const ALL_ON_ALL_OFF_NONE: i64 = 0;

/// Combine the "respond to all on" and "respond to all off" toggles into the
/// firmware's single enumerated value.
pub fn combine_all_on_all_off(all_on: bool, all_off: bool) -> i64 {
    match (all_on, all_off) {
        (true, true) => ALL_ON_ALL_OFF_BOTH,
        (true, false) => ALL_ON_ONLY,
        (false, true) => ALL_OFF_ONLY,
        (false, false) => ALL_ON_ALL_OFF_NONE,
    }
}

/// Split a stored enumerated value back into `(all_on, all_off)`.
///
/// Unknown values fall back to the firmware default of both enabled.
pub fn split_all_on_all_off(value: i64) -> (bool, bool) {
    match value {
        ALL_ON_ONLY => (true, false),
        ALL_OFF_ONLY => (false, true),
        ALL_ON_ALL_OFF_NONE => (false, false),
        _ => (true, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_table() {
        assert_eq!(combine_all_on_all_off(true, true), 255);
        assert_eq!(combine_all_on_all_off(true, false), 2);
        assert_eq!(combine_all_on_all_off(false, true), 1);
        assert_eq!(combine_all_on_all_off(false, false), 0);
    }

    #[test]
    fn test_split_inverts_combination() {
        for (on, off) in [(true, true), (true, false), (false, true), (false, false)] {
            assert_eq!(split_all_on_all_off(combine_all_on_all_off(on, off)), (on, off));
        }
        assert_eq!(split_all_on_all_off(17), (true, true));
    }
}
