fn main() {
    // Propagates ESP-IDF toolchain env vars when cross-building for the jig
    // controller; emits nothing on plain host builds.
    embuild::espidf::sysenv::output();
}
