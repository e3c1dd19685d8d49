use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    mindchat::cli::main()
}
