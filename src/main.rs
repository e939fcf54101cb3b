use std::process::ExitCode;

fn main() -> ExitCode {
    docmerge::cli::run()
}
