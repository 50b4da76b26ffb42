fn main() {
    if let Err(err) = school_ranker::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
