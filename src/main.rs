fn main() {
    if let Err(err) = gba_level_tools::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
