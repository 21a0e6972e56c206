use std::env::var;

const FORWARDED_ENV: [&str; 3] = [
    "CARGO_CFG_TARGET_ARCH",
    "CARGO_CFG_TARGET_ENV",
    "CARGO_CFG_TARGET_OS",
];

fn main() {
    for env in FORWARDED_ENV {
        // The banner falls back to "unknown" for anything not forwarded
        if let Ok(value) = var(env) {
            println!("cargo:rustc-env=SPSCTL_{}={}", env, value);
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
}
