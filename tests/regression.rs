use regex_re2::RegexBuilder;

#[test]
fn invalid_regexes_no_crash() {
    assert!(builder!("(*)").log_errors(false).build().is_err());
    assert!(builder!("(?:?)").log_errors(false).build().is_err());
    assert!(builder!("*").log_errors(false).build().is_err());
    assert!(regex_new!("(?)").is_ok());
}

#[test]
fn regression_many_repeat_no_stack_overflow() {
    let re = regex!("^.{1,1000}");
    assert_eq!(vec![(0, 1)], findall!(re, "a"));
}

#[test]
fn regression_big_counted_repetition() {
    let re = regex!("a{1000}");
    let text = "a".repeat(1000);
    assert!(re.full_match(t!(text)));
    assert!(!re.is_match(&t!(text)[1..]));
}

mat!(regression_unsorted_binary_search_1, r"(?i)[a_]+", "A_", Some((0, 2)));
mat!(regression_unsorted_binary_search_2, r"(?i)[A_]+", "a_", Some((0, 2)));
mat!(regression_negated_char_class_1, r"(?i)[^x]", "x", None);
mat!(regression_negated_char_class_2, r"(?i)[^x]", "X", None);
mat!(regression_negated_word_class, r"(?i)\W", "kK", None);
// Outside brackets this is a class of the characters `:word`.
mat!(regression_posix_class_outside_brackets, r"[:word:]", "_", None);
mat!(regression_posix_class_inside_brackets, r"[[:word:]]", "_", Some((0, 1)));

#[test]
fn regression_captures_rep() {
    let re = regex!(r"([a-f]){2}(?P<foo>[x-z])");
    let caps = re.captures(t!("abx")).unwrap();
    assert_eq!(Some(&b"x"[..]), caps.name("foo"));
    assert_eq!(Some(&b"b"[..]), caps.get(1));
}

mat!(regression_alt_in_alt1, r"ab?|$", "az", Some((0, 1)));
mat!(regression_alt_in_alt2, r"^(.*?)(\n|\r\n?|$)", "ab\rcd", Some((0, 3)));
mat!(regression_leftmost_first_prefix, r"z*azb", "azb", Some((0, 3)));
mat!(many_alternates, r"1|2|3|4|5|6|7|8|9|10|int", "int", Some((0, 3)));
mat!(anchored_prefix1, r"^a\S", "a ", None);
mat!(anchored_prefix2, r"^a\S", "foo boo a ", None);
mat!(anchored_prefix3, r"^-[a-z]", "r-f", None);
mat!(suffix_after_prefix, r"[a-c]+xyz", "abcabcxyz", Some((0, 9)));
mat!(suffix_with_gap, r"abc.*xyz", "zzabc__xyz__xyz", Some((2, 15)));
mat!(never_matches, r"[^\x00-\x{10FFFF}]", "abc", None);
mat!(never_matches_any, r"a\P{Any}", "abc", None);

split!(
    split_on_word_boundary,
    r"\b",
    "Should this (work?)",
    &["", "Should", " ", "this", " (", "work", "?)"]
);
matiter!(
    word_boundary_dfa,
    r"\b",
    "a b c",
    (0, 0),
    (1, 1),
    (2, 2),
    (3, 3),
    (4, 4),
    (5, 5)
);
matiter!(
    not_word_boundary,
    r"\B",
    "ab c",
    (1, 1)
);

// A pattern whose DFA has far more states than fit in a small budget. The
// engines that can give up must fall back without changing the answer.
#[test]
fn dfa_state_blowup_falls_back() {
    use regex_re2::internal::MatchEngine;

    let pattern = r"([01]*)1([01]{12})$";
    let mut text: String = (0..3000)
        .map(|i: u32| if (i * 7 + i / 5) % 3 == 0 { '1' } else { '0' })
        .collect();
    text.push_str("1000000000000");
    let re = builder!(pattern).max_mem(64 << 10).build().unwrap();
    let reference = RegexBuilder::new(pattern)
        .match_engine(MatchEngine::Nfa)
        .build()
        .unwrap();
    assert_eq!(reference.find(t!(text)), re.find(t!(text)));
    let got = re.captures(t!(text)).map(|c| (c.pos(1), c.pos(2)));
    let want = reference.captures(t!(text)).map(|c| (c.pos(1), c.pos(2)));
    assert_eq!(want, got);
}

#[test]
fn search_in_long_haystack() {
    let re = regex!(r"(needle)\d");
    let mut text = "hay ".repeat(10_000);
    text.push_str("needle7");
    let caps = re.captures(t!(text)).unwrap();
    assert_eq!(Some((40_000, 40_006)), caps.pos(1));
}

// An assertion that can only be checked once the next byte is known must
// not let a loop re-enter ahead of a higher priority match.
mat!(
    assertion_in_loop_prefers_match,
    r"(\b|a)+",
    "a",
    Some((0, 0)),
    Some((0, 0))
);
mat!(
    assertion_in_loop_after_bytes,
    r"x(\b|a)+",
    "xa",
    Some((0, 2)),
    Some((1, 2))
);
