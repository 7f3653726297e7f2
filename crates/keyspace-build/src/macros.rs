//! Build-script helper that compiles a schema file into `$OUT_DIR/keyspace.rs`.
//!
//! Call it from a `build.rs` returning `Result<(), Box<dyn Error>>`; the
//! crate then pulls the output in with
//! `include!(concat!(env!("OUT_DIR"), "/keyspace.rs"))`.
#[macro_export]
macro_rules! build {
    ($schema:expr) => {
        use std::{env::var, fs, path::PathBuf};

        //
        // CARGO
        //

        println!("cargo:rerun-if-changed=build.rs");
        println!("cargo:rerun-if-changed={}", $schema);
        println!("cargo:rerun-if-env-changed=KEYSPACE_PROFILE");

        let out_dir = var("OUT_DIR")?;

        //
        // GENERATED CODE
        //

        let source = fs::read_to_string($schema)?;
        let profile = var("KEYSPACE_PROFILE").ok();
        let output = $crate::generate_with_profile(&source, profile.as_deref())?;

        let target = PathBuf::from(out_dir).join("keyspace.rs");
        fs::write(target, output)?;
    };
}
