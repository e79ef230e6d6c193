//! Fieldwork binary entry point.

use fieldwork::ui::output;

fn main() {
    if let Err(e) = fieldwork::cli::run() {
        output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
