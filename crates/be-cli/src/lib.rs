use std::ffi::OsString;
use std::path::Path;

use be_core::BattleEventError;
use be_tool::{assert_case, collect_case_files};
use clap::Parser;
use tracing::debug;

mod cli_args;
mod error_map;
#[cfg(test)]
mod tests;

pub(crate) use cli_args::{CheckArgs, Cli, Mode, RunArgs};
pub(crate) use error_map::{emit_error, map_tool_error, message_json};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return error.exit_code(),
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, BattleEventError> {
    match cli.command {
        Mode::Run(args) => run_case_file(args),
        Mode::Check(args) => run_check_dir(args),
    }
}

fn run_case_file(args: RunArgs) -> Result<i32, BattleEventError> {
    let report = assert_case(Path::new(&args.case)).map_err(map_tool_error)?;
    println!("RESULT:OK");
    println!("STEPS:{}", report.steps);
    println!("FRAMES:{}", report.frames);
    Ok(0)
}

fn run_check_dir(args: CheckArgs) -> Result<i32, BattleEventError> {
    let cases = collect_case_files(Path::new(&args.dir)).map_err(map_tool_error)?;
    let mut failed = 0usize;
    for case in &cases {
        debug!(case = %case.display(), "running case");
        match assert_case(case) {
            Ok(_) => println!("CASE_OK:{}", case.display()),
            Err(error) => {
                failed += 1;
                let error = map_tool_error(error);
                println!("CASE_FAIL:{}", case.display());
                println!("ERROR_CODE:{}", error.code);
                println!("ERROR_MSG_JSON:{}", message_json(&error.message));
            }
        }
    }

    println!("PASSED:{}", cases.len() - failed);
    println!("FAILED:{}", failed);
    if failed > 0 {
        println!("RESULT:ERROR");
        return Ok(1);
    }
    println!("RESULT:OK");
    Ok(0)
}
