// Bakes the release version into the biasctl binary

fn main() {
    // A BIAS_VERSION override wins over the crate version
    let version =
        std::env::var("BIAS_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=BIAS_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=BIAS_VERSION");
}
