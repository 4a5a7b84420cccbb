fn main() -> std::process::ExitCode {
    testsmith_lib::run()
}
