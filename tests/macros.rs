// Macros shared by every test crate. Each crate defines `regex_new!` and
// `builder!` for the matching engine it exercises before including this
// file.

macro_rules! regex {
    ($re:expr) => {
        regex_new!($re).unwrap()
    };
}

macro_rules! t {
    ($text:expr) => {
        $text.as_bytes()
    };
}

macro_rules! findall {
    ($re:expr, $text:expr) => {{
        $re.find_iter(t!($text)).collect::<Vec<(usize, usize)>>()
    }};
}

// Macros for automatically producing tests.

macro_rules! ismatch {
    ($name:ident, $re:expr, $text:expr, $ismatch:expr) => {
        #[test]
        fn $name() {
            let re = regex!($re);
            assert_eq!($ismatch, re.is_match(t!($text)));
        }
    };
}

macro_rules! mat {
    ($name:ident, $re:expr, $text:expr, $($loc:tt)+) => {
        #[test]
        fn $name() {
            let text = t!($text);
            let expected: Vec<Option<(usize, usize)>> = vec![$($loc)+];
            let r = regex!($re);
            let got: Vec<Option<(usize, usize)>> = match r.captures(text) {
                Some(c) => {
                    assert!(r.is_match(text));
                    assert_eq!(r.find(text), c.pos(0));
                    (0..c.len()).map(|i| c.pos(i)).collect()
                }
                None => vec![None],
            };
            // The tests sometimes leave out capture groups, so truncate
            // actual capture groups to match.
            let mut sgot = &got[..];
            if sgot.len() > expected.len() {
                sgot = &sgot[0..expected.len()]
            }
            if expected != sgot {
                panic!(
                    "For RE '{}' against '{:?}', expected '{:?}' but got '{:?}'",
                    $re, text, expected, sgot
                );
            }
        }
    };
}

macro_rules! matiter {
    ($name:ident, $re:expr, $text:expr) => {
        #[test]
        fn $name() {
            let r = regex!($re);
            let got = findall!(r, $text);
            assert_eq!(Vec::<(usize, usize)>::new(), got);
        }
    };
    ($name:ident, $re:expr, $text:expr, $($loc:tt)+) => {
        #[test]
        fn $name() {
            let expected: Vec<(usize, usize)> = vec![$($loc)+];
            let r = regex!($re);
            let got = findall!(r, $text);
            if expected != got {
                panic!(
                    "For RE '{}' against '{:?}', expected '{:?}' but got '{:?}'",
                    $re, $text, expected, got
                );
            }
        }
    };
}

macro_rules! noparse {
    ($name:ident, $re:expr, $kind:ident) => {
        #[test]
        fn $name() {
            let re = $re;
            match builder!(re).log_errors(false).build() {
                Err(err) => {
                    assert_eq!(regex_re2::ErrorKind::$kind, err.kind(), "{}", re)
                }
                Ok(_) => panic!("Regex '{}' should cause a parse error.", re),
            }
        }
    };
}

macro_rules! split {
    ($name:ident, $re:expr, $text:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let re = regex!($re);
            let splitted: Vec<&[u8]> = re.split(t!($text)).collect();
            let expected: Vec<&[u8]> =
                $expected.iter().map(|s: &&str| s.as_bytes()).collect();
            assert_eq!(expected, splitted);
        }
    };
}
