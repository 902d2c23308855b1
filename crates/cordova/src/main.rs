use cordova_lib::BuildError;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cordova::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err
                .downcast_ref::<BuildError>()
                .map_or(1, BuildError::exit_code);
            ExitCode::from(code)
        }
    }
}
