use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=TARGET");

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown-target".to_string());
    println!("cargo:rustc-env=UNIFMT_BUILD_TARGET={target}");
}
