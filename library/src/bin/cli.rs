fn main() -> anyhow::Result<()> {
    env_logger::init();
    properties_core::run(std::env::args().collect())?;
    Ok(())
}
