//! Grammars translated to Rust by the build script, run against the
//! interpreter.

pub mod grammars;

pub mod calc {
    include!(concat!(env!("OUT_DIR"), "/calc.rs"));
}

pub mod words {
    include!(concat!(env!("OUT_DIR"), "/words.rs"));
}

pub mod assign {
    include!(concat!(env!("OUT_DIR"), "/assign.rs"));
}
