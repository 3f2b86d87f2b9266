use regex_re2::{quote_meta, Encoding};

const UNQUOTED: &[&str] = &[
    "foo",
    "foo.bar",
    "foo\\.bar",
    "[1-9]",
    "1.5-2.0?",
    "\\d",
    "Who doesn't like ice cream? I don't",
    "((a|b)c?d*e+[f-h]i)",
    "((?!)xxx).*yyy",
    "([",
    "a{2,}$^|",
    "\t\n\x01\x1F\x7F",
    "é☃",
    "a\0b",
    "\0",
    "\0\0",
    "\x0001",
];

#[test]
fn quoted_matches_itself() {
    for text in UNQUOTED {
        let quoted = quote_meta(text);
        let re = builder!(&quoted).build().unwrap();
        assert!(re.full_match(t!(text)), "quote_meta({:?})", text);
        assert!(re.is_match(format!("x{}x", text).as_bytes()));
    }
}

#[test]
fn quoted_doesnt_match_variants() {
    let re = builder!(quote_meta("1.5-2.0?")).build().unwrap();
    assert!(!re.is_match(t!("1x5-2.0")));
    assert!(!re.full_match(t!("1.5-2.")));
    let re = builder!(quote_meta("a|b")).build().unwrap();
    assert!(!re.is_match(t!("a")));
}

#[test]
fn quoted_case_insensitive() {
    let re = builder!(quote_meta("abc.d"))
        .case_sensitive(false)
        .build()
        .unwrap();
    assert!(re.full_match(t!("ABC.D")));
    assert!(!re.full_match(t!("ABCxD")));
}

#[test]
fn quoted_latin1_bytes() {
    for b in 0..=255u8 {
        let re = builder!(quote_meta([b]))
            .encoding(Encoding::Latin1)
            .build()
            .unwrap();
        assert!(re.full_match(&[b]), "byte {:#x}", b);
    }
    let all: Vec<u8> = (0..=255u8).collect();
    let re = builder!(quote_meta(&all))
        .encoding(Encoding::Latin1)
        .build()
        .unwrap();
    assert!(re.full_match(&all));
}

#[test]
fn quoted_form() {
    assert_eq!(&b"a\\.b"[..], &quote_meta("a.b")[..]);
    assert_eq!(&b"\\x00"[..], &quote_meta("\0")[..]);
    assert_eq!(&b"\\x001"[..], &quote_meta("\x001")[..]);
    assert_eq!(&b"_aZ9"[..], &quote_meta("_aZ9")[..]);
    assert_eq!("é".as_bytes(), &quote_meta("é")[..]);
}
