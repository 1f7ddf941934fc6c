use javelin_assist::{parse_for_completion, parse_for_selection, ParseMode, NONE};
use proptest::prelude::*;

const MAX_FRAGMENTS: usize = 48;

fn fragment() -> impl Strategy<Value = String> {
    const FRAGMENTS: &[&str] = &[
        "class", "interface", "enum", "record", "void", "int", "public", "static", "final",
        "if", "else", "for", "while", "switch", "case", "default", "return", "new", "try",
        "catch", "finally", "throw", "throws", "extends", "implements", "import", "package",
        "var", "yield", "this", "super", "instanceof", "{", "}", "(", ")", "[", "]", "<", ">",
        ">>", ";", ",", ".", "::", "->", "=", "==", "+", "?", ":", "@", "&&", "\"s\"", "'c'",
        "1", "0x1F", "// c\n", "/* c */", "\n",
    ];
    prop_oneof![
        4 => proptest::sample::select(FRAGMENTS).prop_map(ToString::to_string),
        1 => proptest::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,6}").expect("valid regex"),
        1 => proptest::string::string_regex("\"[a-z ]{0,4}").expect("valid regex"),
    ]
}

/// A source built from `fragments` and a caret somewhere in it.
fn source_and_caret() -> impl Strategy<Value = (String, usize)> {
    proptest::collection::vec(fragment(), 0..MAX_FRAGMENTS)
        .prop_map(|fragments| fragments.join(" "))
        .prop_flat_map(|source| {
            let len = source.len();
            (Just(source), 0..=len)
        })
}

fn marker_count(unit: &str) -> usize {
    ["<CompleteOn", "<CompletionOn", "<SelectOn"]
        .iter()
        .map(|prefix| unit.matches(prefix).count())
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn completion_is_total_and_deterministic((source, caret) in source_and_caret()) {
        for mode in [ParseMode::Diet, ParseMode::Method] {
            let first = parse_for_completion(&source, caret, mode).expect("caret is in bounds");
            let second = parse_for_completion(&source, caret, mode).expect("caret is in bounds");
            prop_assert_eq!(first.summary(), second.summary());

            prop_assert!(marker_count(&first.unit_string()) <= 1);
            if first.marker_kind().is_none() {
                prop_assert_eq!(first.marker_string(), NONE);
            }
            if let Some(replaced) = first.replaced_range() {
                prop_assert!(replaced.end as usize <= caret);
                prop_assert_eq!(
                    first.replaced_source(),
                    source.get(replaced.start as usize..replaced.end as usize)
                );
            }
        }
    }

    #[test]
    fn method_mode_finds_every_diet_marker((source, caret) in source_and_caret()) {
        let diet = parse_for_completion(&source, caret, ParseMode::Diet).expect("caret is in bounds");
        if diet.marker_kind().is_some() {
            let method = parse_for_completion(&source, caret, ParseMode::Method).expect("caret is in bounds");
            prop_assert_eq!(method.marker_string(), diet.marker_string());
        }
    }

    #[test]
    fn selection_places_at_most_one_marker(
        (source, start) in source_and_caret(),
        width in 0usize..12,
    ) {
        let end = (start + width).min(source.len());
        let result = parse_for_selection(&source, start, end).expect("selection is in bounds");
        prop_assert!(marker_count(&result.unit_string()) <= 1);
        if result.marker_kind().is_none() {
            prop_assert_eq!(result.marker_string(), NONE);
        }
    }
}
