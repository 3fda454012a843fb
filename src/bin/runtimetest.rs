use anyhow::Result;

fn main() -> Result<()> {
    runtimetest::cli::run()
}
