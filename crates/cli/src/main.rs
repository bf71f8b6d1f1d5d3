use std::process::ExitCode;

fn main() -> ExitCode {
    hrdesk_cli::run()
}
