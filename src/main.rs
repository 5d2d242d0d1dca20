use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    gemini_chat::cli::main()
}
