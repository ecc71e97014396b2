use std::rc::Rc;

use csv_ingest::{fingerprint::fingerprint, rows::SourceRow};
use proptest::prelude::*;

fn row(pairs: &[(String, String)]) -> SourceRow {
    let headers: Rc<[String]> = Rc::from(
        pairs
            .iter()
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>(),
    );
    let values = pairs.iter().map(|(_, value)| value.clone()).collect();
    SourceRow::new(1, headers, values)
}

fn columns_and_values() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z_]{1,8}", "[ -~]{0,12}", 1..6)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn fingerprint_is_stable_across_calls(pairs in columns_and_values()) {
        let source = row(&pairs);
        let names = pairs.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        prop_assert_eq!(fingerprint(&source, &names), fingerprint(&source, &names));
    }

    #[test]
    fn fingerprint_ignores_column_order(pairs in columns_and_values(), seed in any::<u64>()) {
        let mut shuffled = pairs.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 1 {
            shuffled.reverse();
        }

        let names = pairs.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        let shuffled_names = shuffled.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        prop_assert_eq!(
            fingerprint(&row(&pairs), &names),
            fingerprint(&row(&shuffled), &shuffled_names)
        );
    }

    #[test]
    fn changing_one_field_changes_fingerprint(
        pairs in columns_and_values(),
        pick in any::<prop::sample::Index>(),
        suffix in "[a-z0-9]{1,4}",
    ) {
        let names = pairs.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        let mut altered = pairs.clone();
        let idx = pick.index(altered.len());
        altered[idx].1.push_str(&suffix);

        prop_assert_ne!(
            fingerprint(&row(&pairs), &names),
            fingerprint(&row(&altered), &names)
        );
    }
}
