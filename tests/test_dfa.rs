// Due to macro scoping rules, these definitions only apply for the modules
// defined below. Effectively, they allow us to use the same tests for every
// matching engine.
//
// This one uses the lazy DFA for match bounds and the NFA for submatches.
macro_rules! builder {
    ($re:expr) => {{
        use regex_re2::internal::MatchEngine;
        let mut builder = regex_re2::RegexBuilder::new($re);
        builder.match_engine(MatchEngine::Dfa);
        builder
    }};
}

macro_rules! regex_new {
    ($re:expr) => {{
        builder!($re).build()
    }};
}

// Must come before other module definitions.
include!("macros.rs");

mod crazy;
mod flags;
mod match_range;
mod noparse;
mod posix;
mod quote_meta;
mod regression;
