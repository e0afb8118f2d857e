use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Soft-AP credentials from environment variables (optional)
    // These become the registered defaults of NET_SSID / NET_PASS

    if let Ok(ssid) = env::var("AP_SSID") {
        println!("cargo:rustc-env=AP_SSID={}", ssid);
        println!("cargo:warning=Using AP_SSID from environment: {}", ssid);
    } else {
        println!("cargo:rustc-env=AP_SSID=rc-bridge");
    }

    if let Ok(password) = env::var("AP_PASSWORD") {
        if !password.is_empty() && password.len() < 8 {
            println!("cargo:warning=AP_PASSWORD shorter than 8 characters, AP will be open");
        }
        println!("cargo:rustc-env=AP_PASSWORD={}", password);
        println!("cargo:warning=Using AP_PASSWORD from environment (hidden)");
    } else {
        println!("cargo:rustc-env=AP_PASSWORD=");
    }

    println!("cargo:rerun-if-env-changed=AP_SSID");
    println!("cargo:rerun-if-env-changed=AP_PASSWORD");

    // Linker scripts only apply to the embedded target
    let target = env::var("TARGET").unwrap_or_default();
    if !target.starts_with("thumb") {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    fs::write(out_dir.join("memory.x"), include_bytes!("memory.x"))
        .expect("Failed to write memory.x");
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
