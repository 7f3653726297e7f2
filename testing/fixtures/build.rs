use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    keyspace_build::build!("schema.toml");

    Ok(())
}
