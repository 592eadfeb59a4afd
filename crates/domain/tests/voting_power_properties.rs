use chrono::TimeDelta;
use primitive_types::U256;
use proptest::prelude::*;
use rbn_lens_domain::value_objects::Amount;
use rbn_lens_domain::voting_power::{MAX_LOCK_HOURS, compute_voting_power};

fn amount(raw: u128) -> Amount {
    Amount::new(U256::from(raw), 18)
}

proptest! {
    #[test]
    fn expired_locks_have_no_power(raw in any::<u128>(), hours in -100_000i64..=0) {
        let vp = compute_voting_power(amount(raw), TimeDelta::hours(hours));
        prop_assert!(vp.is_zero());
    }

    #[test]
    fn max_lock_returns_full_amount(raw in any::<u128>()) {
        let a = amount(raw);
        prop_assert_eq!(compute_voting_power(a, TimeDelta::hours(MAX_LOCK_HOURS)), a);
    }

    #[test]
    fn monotonic_in_time_to_expiry(
        raw in any::<u128>(),
        a in -1_000_000i64..2_000_000,
        b in -1_000_000i64..2_000_000,
    ) {
        let (short, long) = if a <= b { (a, b) } else { (b, a) };
        let locked = amount(raw);
        let vp_short = compute_voting_power(locked, TimeDelta::minutes(short));
        let vp_long = compute_voting_power(locked, TimeDelta::minutes(long));
        prop_assert!(vp_short <= vp_long);
    }

    #[test]
    fn never_exceeds_locked_amount(raw in any::<u128>(), hours in 0i64..100_000) {
        let locked = amount(raw);
        prop_assert!(compute_voting_power(locked, TimeDelta::hours(hours)) <= locked);
    }
}

#[test]
fn documented_examples() {
    let thousand = Amount::parse_units("1000", 18).unwrap();
    assert_eq!(
        compute_voting_power(thousand, TimeDelta::hours(17_520)).format_units(),
        "1000"
    );
    assert_eq!(
        compute_voting_power(thousand, TimeDelta::hours(8_760)).format_units(),
        "500"
    );
}
