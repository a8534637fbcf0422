fn main() {
    if let Err(err) = flowlabel::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
