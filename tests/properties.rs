use litchi_xlsx::sheet::{
    Font, InternTable, MAX_COLS, MAX_ROWS, Style, StyleTable, format_range, format_ref, hash_legacy_password,
    parse_range, parse_ref,
};
use proptest::prelude::*;

fn style_strategy() -> impl Strategy<Value = Style> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::sample::select(vec![9.0, 10.0, 11.0, 14.5]),
        prop::sample::select(vec!["General", "0.00", "0.00%", "yyyy-mm-dd", "#,##0;[Red]-#,##0"]),
    )
        .prop_map(|(bold, italic, size, number_format)| Style {
            number_format: number_format.into(),
            font: Font {
                bold,
                italic,
                size,
                ..Font::default()
            },
            ..Style::default()
        })
}

proptest! {
    #[test]
    fn prop_ref_round_trip(row in 0..MAX_ROWS, col in 0..MAX_COLS) {
        let text = format_ref(row, col);
        prop_assert_eq!(parse_ref(&text).unwrap(), (row, col));
        prop_assert_eq!(parse_ref(&text.to_lowercase()).unwrap(), (row, col));
    }

    #[test]
    fn prop_range_normalises_corners(
        a in (0..MAX_ROWS, 0..MAX_COLS),
        b in (0..MAX_ROWS, 0..MAX_COLS),
    ) {
        let text = format!("{}:{}", format_ref(b.0, b.1), format_ref(a.0, a.1));
        let range = parse_range(&text).unwrap();
        prop_assert_eq!(range.origin, (a.0.min(b.0), a.1.min(b.1)));
        prop_assert_eq!(range.last(), (a.0.max(b.0), a.1.max(b.1)));
        prop_assert_eq!(parse_range(&format_range(&range)).unwrap(), range);
    }

    #[test]
    fn prop_style_interning(a in style_strategy(), b in style_strategy()) {
        let mut table = StyleTable::new();
        let ia = table.intern(&a);
        let ib = table.intern(&b);
        prop_assert_eq!(ia == ib, a == b);
        prop_assert_eq!(table.intern(&a.clone()), ia);
        prop_assert_eq!(table.get(ia).unwrap(), &a);
    }

    #[test]
    fn prop_intern_table_indices_are_stable(values in prop::collection::vec(0u8..20, 0..64)) {
        let mut table = InternTable::new();
        let indices: Vec<u32> = values.iter().map(|v| table.intern(*v)).collect();
        for (value, index) in values.iter().zip(&indices) {
            prop_assert_eq!(table.get(*index).unwrap(), value);
            prop_assert_eq!(table.find(value), Some(*index));
        }
        let distinct: std::collections::HashSet<_> = values.iter().collect();
        prop_assert_eq!(table.len(), distinct.len());
    }
}

#[test]
fn test_rejected_references() {
    for bad in ["", "A", "1", "A0", "A01", "1A", "XFE1", "A1048577", "A1B"] {
        assert!(parse_ref(bad).is_err(), "{bad:?} should be rejected");
    }
    assert_eq!(parse_ref("$B$2").unwrap(), (1, 1));
}

#[test]
fn test_legacy_password_hash() {
    assert_eq!(hash_legacy_password("abc"), "CC1A");
}

#[test]
fn test_intern_out_of_range() {
    let table: InternTable<u8> = InternTable::new();
    assert!(matches!(
        table.get(0),
        Err(litchi_xlsx::Error::IndexOutOfRange { index: 0, len: 0 })
    ));
}
