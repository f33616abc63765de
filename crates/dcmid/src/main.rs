use std::process::ExitCode;

fn main() -> ExitCode {
    match dcmid::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("dcmid: {error}");
            ExitCode::FAILURE
        }
    }
}
