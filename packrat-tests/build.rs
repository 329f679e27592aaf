use std::error::Error;

#[path = "src/grammars.rs"]
mod grammars;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=src/grammars.rs");

    packrat::cargo_build(&grammars::calc()?, "calc")?;
    packrat::cargo_build(&grammars::words()?, "words")?;
    packrat::cargo_build(&grammars::assign()?, "assign")?;
    Ok(())
}
