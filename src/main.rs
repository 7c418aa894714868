fn main() -> anyhow::Result<()> {
    fleeting_notes::cli::run()
}
