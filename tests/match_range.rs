use regex_re2::Encoding;

macro_rules! range {
    ($name:ident, $re:expr, $max_len:expr, $min:expr, $max:expr) => {
        #[test]
        fn $name() {
            let re = regex!($re);
            let got = re.possible_match_range($max_len);
            let want = (t!($min).to_vec(), t!($max).to_vec());
            assert_eq!(Some(want), got, "for '{}'", $re);
        }
    };
}

range!(literal, "abc", 10, "abc", "abc");
range!(case_insensitive, "(?i)abc", 10, "ABC", "abc");
range!(plus_prefix, "a+hello", 10, "aa", "ahello");
range!(star_prefix, "a*hello", 10, "a", "hello");
range!(alternation, "def|abc", 10, "abc", "def");
range!(repeated_group, "(abc)+", 5, "abc", "abcac");
range!(repeated_group_short, "(abc)+", 2, "ab", "ac");
range!(class_plus_short, "[a-c]+", 2, "a", "cd");
range!(class_plus, "[a-c]+", 3, "a", "ccd");

#[test]
fn no_room() {
    let re = regex!("abc");
    assert_eq!(None, re.possible_match_range(0));
}

#[test]
fn unbounded_high_bytes() {
    let re = builder!("(?s).*")
        .encoding(Encoding::Latin1)
        .build()
        .unwrap();
    assert_eq!(None, re.possible_match_range(10));
}

#[test]
fn every_match_is_in_range() {
    let re = regex!("(abc)+");
    let (min, max) = re.possible_match_range(5).unwrap();
    for text in ["abc", "abcabc", "abcabcabc"] {
        assert!(re.full_match(t!(text)));
        assert!(min.as_slice() <= t!(text));
        assert!(t!(text) <= max.as_slice());
    }
}
