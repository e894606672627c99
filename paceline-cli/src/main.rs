fn main() {
    if let Err(e) = paceline_cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
