fn main() {
    // Optional JSON config baked into the firmware image (see config.rs).
    println!("cargo:rerun-if-env-changed=COOP_CONFIG_JSON");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
