fn main() {
    // opencv binding generation needs libclang; env changes made here never reach
    // the opencv build script, so only point the user at the usual location
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos")
        && std::env::var_os("LIBCLANG_PATH").is_none()
    {
        println!(
            "cargo:warning=LIBCLANG_PATH is unset; if the opencv build fails, export \
             LIBCLANG_PATH=/Library/Developer/CommandLineTools/usr/lib"
        );
    }

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LIBCLANG_PATH");
}
