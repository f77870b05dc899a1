fn main() {
    std::process::exit(nestspec::cli::run());
}
