//! Command implementations.
//!
//! Each command returns the text to show the user; `main` prints it.

pub mod cart;

/// Print command output to stdout.
#[allow(clippy::print_stdout)]
pub fn print(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}
