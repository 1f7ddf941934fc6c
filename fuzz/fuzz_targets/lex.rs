#![no_main]

use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let mut end = 0;
    for token in javelin_syntax::Lexer::new(text) {
        assert_eq!(token.range.start as usize, end, "lexer left a gap");
        end = token.range.end as usize;
    }
    assert_eq!(end, text.len());
});
