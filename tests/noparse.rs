noparse!(fail_double_repeat, "a**", RepeatOp);
noparse!(fail_lazy_repeat_repeat, "a*?+", RepeatOp);
noparse!(fail_no_repeat_arg, "*", RepeatArgument);
noparse!(fail_no_repeat_arg_group, "(*)", RepeatArgument);
noparse!(fail_no_repeat_arg_alt, "a|*", RepeatArgument);
noparse!(fail_no_counted_arg, "{1}", RepeatArgument);
noparse!(fail_incomplete_escape, "\\", TrailingBackslash);
noparse!(fail_class_incomplete, "[A-", MissingBracket);
noparse!(fail_class_not_closed, "[A", MissingBracket);
noparse!(fail_class_no_begin, r"[\A]", BadEscape);
noparse!(fail_class_no_end, r"[\z]", BadEscape);
noparse!(fail_class_no_boundary, r"[\b]", BadEscape);
noparse!(fail_open_paren, "(", MissingParen);
noparse!(fail_close_paren, ")", UnexpectedParen);
noparse!(fail_invalid_range, "[a-Z]", BadCharRange);
noparse!(fail_empty_capture_name, "(?P<>a)", BadNamedCapture);
noparse!(fail_bad_capture_name, "(?P<na-me>)", BadNamedCapture);
noparse!(fail_unclosed_capture_name, "(?P<name", BadNamedCapture);
noparse!(fail_dupe_named, "(?P<a>.)(?P<a>.)", BadNamedCapture);
noparse!(fail_dupe_named_angle, "(?<a>.)(?P<a>.)", BadNamedCapture);
noparse!(fail_bad_flag, "(?a)a", BadPerlOp);
noparse!(fail_unfinished_cap, "(?", BadPerlOp);
noparse!(fail_unfinished_flags, "(?i", BadPerlOp);
noparse!(fail_double_neg, "(?-i-i)", BadPerlOp);
noparse!(fail_neg_empty, "(?i-)", BadPerlOp);
noparse!(fail_lookahead, "(?=a)", BadPerlOp);
noparse!(fail_neg_lookahead, "(?!a)", BadPerlOp);
noparse!(fail_lookbehind, "(?<=a)", BadPerlOp);
noparse!(fail_neg_lookbehind, "(?<!a)", BadPerlOp);
noparse!(fail_too_big, "a{10000000}", RepeatSize);
noparse!(fail_counted_too_big, "a{1001}", RepeatSize);
noparse!(fail_counted_decreasing, "a{2,1}", RepeatSize);
noparse!(fail_counted_nested, "(a{100}){11}", RepeatSize);
noparse!(fail_octal_digit, r"\8", BadEscape);
noparse!(fail_backreference, r"(a)\1", BadEscape);
noparse!(fail_hex_digit, r"\xG0", BadEscape);
noparse!(fail_hex_short, r"\xF", BadEscape);
noparse!(fail_hex_long_digits, r"\x{fffg}", BadEscape);
noparse!(fail_hex_too_big, r"\x{110000}", BadEscape);
noparse!(fail_unknown_escape, r"\q", BadEscape);
noparse!(fail_range_end_no_begin, r"[a-\A]", BadEscape);
noparse!(fail_range_end_no_end, r"[a-\z]", BadEscape);
noparse!(fail_range_end_no_boundary, r"[a-\b]", BadEscape);
noparse!(fail_unknown_posix_class, "[[:foo:]]", BadCharRange);
noparse!(fail_unknown_unicode_class, r"\p{Greek}", BadCharRange);
noparse!(fail_unknown_unicode_short, r"\pL", BadCharRange);
noparse!(fail_unclosed_unicode_class, r"\p{Any", BadCharRange);

#[test]
fn fail_deep_nesting() {
    let re = "(".repeat(300) + &")".repeat(300);
    let err = builder!(&re).log_errors(false).build().unwrap_err();
    assert_eq!(regex_re2::ErrorKind::PatternTooLarge, err.kind());
    // A reasonable depth is fine.
    let re = "(".repeat(100) + "a" + &")".repeat(100);
    assert!(builder!(&re).build().is_ok());
}

#[test]
fn fail_over_budget() {
    let err = builder!("a{1000}")
        .max_mem(1000)
        .log_errors(false)
        .build()
        .unwrap_err();
    assert_eq!(regex_re2::ErrorKind::PatternTooLarge, err.kind());
    assert!(builder!("a{1000}").build().is_ok());
}

#[test]
fn error_argument() {
    let err = builder!("a{2,1}").log_errors(false).build().unwrap_err();
    assert_eq!("{2,1}", err.arg());
    assert_eq!("invalid repetition size: {2,1}", err.to_string());
    let err = builder!("x[^a").log_errors(false).build().unwrap_err();
    assert_eq!("[^a", err.arg());
}

// These look odd, but they're all valid.
#[test]
fn valid_oddities() {
    for re in &[
        "(?)", "()", "(?:)", "|a", "a|", "(?P<name>)", "a{,5}", "a{1000}",
        "{", "a{", "x{2", r"\0", "[]a]", "[a-]", r"\P{Any}", r"(?i)\p{^Any}",
        "(?i-s:a)", r"\Q*\E+", r"\Qab",
    ] {
        if let Err(err) = builder!(*re).build() {
            panic!("'{}' should parse: {}", re, err);
        }
    }
}
