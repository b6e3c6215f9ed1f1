fn main() -> Result<(), Box<dyn std::error::Error>> {
    medassist::cli::main()
}
