fn main() {
    if let Err(e) = dossier::cli::main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
