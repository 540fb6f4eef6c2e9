const PROTO: &str = "proto/gtfs-realtime.proto";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={PROTO}");

    // SAFETY: build scripts are single-threaded
    unsafe {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    prost_build::Config::new().compile_protos(&[PROTO], &["proto/"])?;

    Ok(())
}
