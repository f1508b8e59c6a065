fn main() {
    #[cfg(feature = "cli")]
    spedec::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("spedec: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
