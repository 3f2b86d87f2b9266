use regex_re2::{ErrorKind, Options};

macro_rules! posix {
    ($re:expr) => {
        builder!($re).options(Options::posix()).build()
    };
}

fn posix_err(re: &str) -> ErrorKind {
    let mut options = Options::posix();
    options.set_log_errors(false);
    match builder!(re).options(options).build() {
        Ok(_) => panic!("'{}' should not parse as POSIX", re),
        Err(err) => err.kind(),
    }
}

#[test]
fn perl_extensions_are_rejected() {
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\d"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"[\w]"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\b"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\A"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\z"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\C"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\pL"));
    assert_eq!(ErrorKind::BadEscape, posix_err(r"\Qa.b\E"));
    // `(?` is a group whose first item is a bare `?`.
    assert_eq!(ErrorKind::RepeatArgument, posix_err("(?i)abc"));
    assert_eq!(ErrorKind::BadCharRange, posix_err("[a-b-c]"));
}

#[test]
fn perl_classes_and_word_boundary_options() {
    let re = builder!(r"\d+\b")
        .options(Options::posix())
        .perl_classes(true)
        .word_boundary(true)
        .build()
        .unwrap();
    assert_eq!(Some((2, 4)), re.find(t!("a 12 b")));
    assert!(!re.is_match(t!("12b")));
}

#[test]
fn line_anchors_by_default() {
    let re = posix!("^b").unwrap();
    assert_eq!(Some((2, 3)), re.find(t!("a\nb")));
    let re = posix!("a$").unwrap();
    assert_eq!(Some((0, 1)), re.find(t!("a\nb")));

    let re = builder!("^b")
        .options(Options::posix())
        .one_line(true)
        .build()
        .unwrap();
    assert_eq!(None, re.find(t!("a\nb")));
    assert_eq!(Some((0, 1)), re.find(t!("b\na")));
}

#[test]
fn stacked_repetitions_nest() {
    let re = posix!("a**").unwrap();
    assert_eq!(Some((0, 3)), re.find(t!("aaa")));
    let re = posix!("a*?").unwrap();
    assert_eq!(Some((0, 2)), re.find(t!("aa")));
}

#[test]
fn leftmost_longest() {
    let re = posix!("a|ab|abc").unwrap();
    assert_eq!(Some((0, 3)), re.find(t!("abcd")));
    let re = posix!("(a+)(b+)?").unwrap();
    assert_eq!(Some((0, 4)), re.find(t!("aabb")));
}

#[test]
fn posix_classes_are_kept() {
    let re = posix!("[[:digit:]]+").unwrap();
    assert_eq!(Some((1, 3)), re.find(t!("x42y")));
    let re = posix!("[[:^space:]]+").unwrap();
    assert_eq!(Some((1, 3)), re.find(t!(" ab ")));
}

#[test]
fn perl_mode_is_default() {
    let opts = Options::default();
    assert!(!opts.posix_syntax());
    let re = builder!(r"\d+\b").build().unwrap();
    assert_eq!(Some((2, 4)), re.find(t!("a 12 b")));
}
