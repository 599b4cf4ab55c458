fn main() {
    // Only device builds need the ESP-IDF environment exported; host builds
    // (tests, simulation) compile the same sources against std.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
