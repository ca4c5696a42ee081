fn main() {
    if let Err(e) = salesdash_lib::run() {
        eprintln!("salesdash: {}", e);
        std::process::exit(1);
    }
}
