use std::env;

fn main() {
    // Reported by `argoagent version`
    println!(
        "cargo:rustc-env=CARGO_PKG_RUST_VERSION={}",
        env::var("RUSTC_VERSION").unwrap_or_else(|_| "unknown".to_string())
    );

    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("windows") {
        println!("cargo:rustc-link-arg=/SUBSYSTEM:CONSOLE");
    }

    // Strip symbols from release binaries
    if env::var("PROFILE").as_deref() == Ok("release")
        && env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("linux")
    {
        println!("cargo:rustc-link-arg-bins=-s");
    }
}
