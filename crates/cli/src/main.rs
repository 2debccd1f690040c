use std::process::ExitCode;

fn main() -> ExitCode {
    dynaprice_cli::run()
}
