fn main() {
    // Host builds (`--no-default-features`) skip the ESP-IDF environment.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
