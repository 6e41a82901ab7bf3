use std::process::ExitCode;

fn main() -> ExitCode {
    namefmt_cli::run()
}
