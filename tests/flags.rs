mat!(match_flag_case, "(?i)abc", "ABC", Some((0, 3)));
mat!(match_flag_weird_case, "(?i)a(?-i)bc", "Abc", Some((0, 3)));
mat!(match_flag_weird_case_not, "(?i)a(?-i)bc", "ABC", None);
mat!(match_flag_case_dotnl, "(?is)a.", "A\n", Some((0, 2)));
mat!(match_flag_case_dotnl_toggle, "(?is)a.(?-is)a.", "A\nab", Some((0, 4)));
mat!(match_flag_case_dotnl_toggle_not, "(?is)a.(?-is)a.", "A\na\n", None);
mat!(
    match_flag_case_dotnl_toggle_ok,
    "(?is)a.(?-is:a.)?",
    "A\na\n",
    Some((0, 2))
);
mat!(match_flag_multi, "(?m)(?:^\\d+$\n?)+", "123\n456\n789", Some((0, 11)));
mat!(match_flag_ungreedy, "(?U)a+", "aa", Some((0, 1)));
mat!(match_flag_ungreedy_greedy, "(?U)a+?", "aa", Some((0, 2)));
mat!(match_flag_ungreedy_noop, "(?U)(?-U)a+", "aa", Some((0, 2)));
mat!(match_flag_group_scope, "(?:(?i)a)a", "Aa", Some((0, 2)));
mat!(match_flag_group_scope_not, "(?:(?i)a)a", "AA", None);
mat!(match_flag_case_ascii_only, "(?i)é", "É", None);

#[test]
fn greedy_dot_stops_at_newline() {
    let re = regex!("a.*a");
    assert_eq!(Some((0, 3)), re.find(t!("aba\naba")));

    let re = builder!("a.*a").dot_nl(true).build().unwrap();
    assert_eq!(Some((0, 7)), re.find(t!("aba\naba")));
}

#[test]
fn case_insensitive_option() {
    let re = builder!("abc").case_sensitive(false).build().unwrap();
    assert!(re.is_match(t!("xAbC")));
    // Inline flags override the option.
    let re = builder!("(?-i)abc").case_sensitive(false).build().unwrap();
    assert!(!re.is_match(t!("ABC")));
    assert!(re.is_match(t!("abc")));
}

#[test]
fn literal_option() {
    let re = builder!("a+(b").literal(true).build().unwrap();
    assert_eq!(Some((1, 5)), re.find(t!("xa+(b")));
    assert!(!re.is_match(t!("aab")));
    assert_eq!(0, re.number_of_capturing_groups());

    let re = builder!("ab").literal(true).case_sensitive(false).build();
    assert!(re.unwrap().is_match(t!("AB")));
}

#[test]
fn never_nl_option() {
    let re = builder!("a[^x]b").never_nl(true).build().unwrap();
    assert!(re.is_match(t!("a-b")));
    assert!(!re.is_match(t!("a\nb")));

    let re = builder!("(?s)a.b").never_nl(true).build().unwrap();
    assert!(!re.is_match(t!("a\nb")));

    let re = builder!("a\nb").never_nl(true).build().unwrap();
    assert!(!re.is_match(t!("a\nb")));

    let re = builder!(r"a\sb").never_nl(true).build().unwrap();
    assert!(re.is_match(t!("a b")));
    assert!(!re.is_match(t!("a\nb")));
}

#[test]
fn never_capture_option() {
    let re = builder!("(a)(?P<n>b)").never_capture(true).build().unwrap();
    assert_eq!(0, re.number_of_capturing_groups());
    assert!(re.named_capturing_groups().is_empty());
    let caps = re.captures(t!("xab")).unwrap();
    assert_eq!(1, caps.len());
    assert_eq!(Some((1, 3)), caps.pos(0));

    // Rewrites can only refer to the whole match.
    assert!(re.check_rewrite_string(br"\1").is_err());
    assert!(re.check_rewrite_string(br"<\0>").is_ok());

    // Names are still checked.
    let err = builder!("(?P<n>a)(?P<n>b)")
        .never_capture(true)
        .log_errors(false)
        .build()
        .unwrap_err();
    assert_eq!(regex_re2::ErrorKind::BadNamedCapture, err.kind());
}
