use clap::{Parser, Subcommand};

use commands::GlobalArgs;
use surge::report::Reporter;

mod commands;
mod output;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "surge")]
#[command(version = VERSION)]
#[command(about = "Run deployment tasks against a remote host over ssh")]
struct Cli {
    /// Settings file (JSON). Defaults to $SURGE_SETTINGS, then ./surge.json
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<String>,

    /// Override one setting; repeatable
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,

    /// Print the commands a task would run without executing them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the result as a JSON envelope on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tasks
    List,
    /// Any task name or alias, followed by --key value arguments
    #[command(external_subcommand)]
    Task(Vec<String>),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        settings: cli.settings,
        set: cli.set,
        dry_run: cli.dry_run,
        json: cli.json,
    };

    let exit_code = match cli.command {
        Some(Commands::List) => {
            let result = commands::list::run();
            match (global.json, result) {
                (true, result) => emit_json(result),
                (false, Ok((summaries, code))) => {
                    commands::list::render(&summaries, &mut Reporter::stdout());
                    code
                }
                (false, Err(err)) => emit_error(&err),
            }
        }
        Some(Commands::Task(argv)) => {
            let (name, extra) = match argv.split_first() {
                Some((name, extra)) => (Some(name.as_str()), extra),
                None => (None, &argv[..]),
            };
            finish_run(commands::run::run(name, extra, &global), &global)
        }
        None => finish_run(commands::run::run(None, &[], &global), &global),
    };

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn finish_run(result: commands::CmdResult<commands::run::RunOutput>, global: &GlobalArgs) -> i32 {
    if global.json {
        return emit_json(result);
    }
    match result {
        Ok((_, code)) => code,
        Err(err) => emit_error(&err),
    }
}

fn emit_json<T: serde::Serialize>(result: commands::CmdResult<T>) -> i32 {
    let (json_result, exit_code) = output::map_cmd_result_to_json(result);
    if output::print_json_result(json_result).is_err() {
        return 1;
    }
    exit_code
}

fn emit_error(err: &surge::Error) -> i32 {
    output::render_error(err, &mut Reporter::stderr());
    output::exit_code_for_error(err.code)
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
