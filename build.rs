fn main() {
    // The ESP-IDF link environment only exists when cross-compiling for the
    // watch; host builds (simulator, tests) need nothing from here.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
