use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use atty::Stream;
use clap::{value_parser, ArgAction, Args, Parser, Subcommand};
use color_eyre::Result;
use envwizard_core::{
    dotenv_create, project_detect, project_init, venv_create, CommandContext, CommandGroup,
    CommandStatus, DotenvCreateRequest, ExecutionOutcome, GlobalOptions, ProjectDetectRequest,
    ProjectInitRequest, VenvCreateRequest,
};
use serde_json::{json, Value};

mod style;

use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = WizardCli::parse();
    init_tracing(cli.trace, cli.debug, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        debug: cli.debug,
        json: cli.json,
    };

    let ctx = CommandContext::new(&global);
    let group = command_group(&cli.command);
    let outcome = match dispatch(&ctx, &cli) {
        Ok(outcome) => outcome,
        Err(err) => ExecutionOutcome::failure(format!("{err:#}"), json!({})),
    };
    let code = emit_output(&cli, group, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, debug: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else if debug {
        "debug"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("envwizard={level},envwizard_core={level},envwizard_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn dispatch(ctx: &CommandContext, cli: &WizardCli) -> anyhow::Result<ExecutionOutcome> {
    match &cli.command {
        Command::Init(args) => run_init(ctx, cli, args),
        Command::Detect(args) => project_detect(
            ctx,
            ProjectDetectRequest {
                path: args.path.clone(),
            },
        ),
        Command::CreateVenv(args) => venv_create(
            ctx,
            VenvCreateRequest {
                path: args.path.clone(),
                name: args.name.clone(),
                python: args.python.clone(),
            },
        ),
        Command::CreateDotenv(args) => dotenv_create(
            ctx,
            DotenvCreateRequest {
                path: args.path.clone(),
            },
        ),
    }
}

fn run_init(
    ctx: &CommandContext,
    cli: &WizardCli,
    args: &InitArgs,
) -> anyhow::Result<ExecutionOutcome> {
    if !cli.json {
        let preview = project_detect(
            ctx,
            ProjectDetectRequest {
                path: args.path.clone(),
            },
        )?;
        if preview.status != CommandStatus::Ok {
            return Ok(preview);
        }
        if !cli.quiet {
            let style = Style::new(cli.no_color, atty::is(Stream::Stdout));
            let message =
                envwizard_core::format_status_message(CommandGroup::Detect, &preview.message);
            println!("{}", style.status(&preview.status, &message));
            render_detect_details(&style, &preview.details);
        }
        if should_confirm(ctx, args.yes) && !confirm_proceed()? {
            return Ok(ExecutionOutcome::success(
                "setup cancelled",
                json!({ "cancelled": true }),
            ));
        }
    }

    project_init(
        ctx,
        ProjectInitRequest {
            path: args.path.clone(),
            venv_name: args.venv_name.clone(),
            install: !args.no_install,
            dotenv: !args.no_dotenv,
            python: args.python.clone(),
        },
    )
}

/// Interactive confirmation only makes sense on a terminal outside CI.
fn should_confirm(ctx: &CommandContext, yes: bool) -> bool {
    !(yes
        || ctx.env_flag_enabled("CI")
        || !atty::is(Stream::Stdin)
        || !atty::is(Stream::Stdout))
}

fn confirm_proceed() -> anyhow::Result<bool> {
    eprint!("Proceed with environment setup? (Y/n) ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

fn emit_output(cli: &WizardCli, group: CommandGroup, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = match outcome.status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    };

    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = envwizard_core::to_json_response(group, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet {
        let message = envwizard_core::format_status_message(group, &outcome.message);
        println!("{}", style.status(&outcome.status, &message));
        render_details(&style, group, &outcome.details);
        if let Some(hint) = hint_from_details(&outcome.details) {
            let hint_line = format!("Hint: {hint}");
            println!("{}", style.info(&hint_line));
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn render_details(style: &Style, group: CommandGroup, details: &Value) {
    match group {
        CommandGroup::Detect => render_detect_details(style, details),
        CommandGroup::Init => render_init_details(style, details),
        CommandGroup::CreateVenv => render_activation(style, details.get("activation")),
        CommandGroup::CreateDotenv => render_dotenv_details(style, details),
    }
}

fn render_detect_details(style: &Style, details: &Value) {
    if let Some(frameworks) = string_list(details, "frameworks") {
        if !frameworks.is_empty() {
            println!("  Frameworks: {}", frameworks.join(", "));
        }
    }
    if let Some(files) = string_list(details, "dependency_files") {
        if !files.is_empty() {
            println!("  Dependency files: {}", files.join(", "));
        }
    }
    if let Some(python) = details.get("python_version").and_then(Value::as_str) {
        println!("  Python: {python}");
    }
    render_warnings(style, details);
}

fn render_init_details(style: &Style, details: &Value) {
    if let Some(frameworks) = string_list(details, "frameworks") {
        if !frameworks.is_empty() {
            println!("  Frameworks: {}", frameworks.join(", "));
        }
    }
    for key in ["venv", "install", "dotenv"] {
        if let Some(line) = stage_line(style, key, details.get(key)) {
            println!("{line}");
        }
    }
    let activation = details.get("venv").and_then(|stage| stage.get("activation"));
    render_activation(style, activation);
    render_warnings(style, details);
}

fn render_dotenv_details(style: &Style, details: &Value) {
    if let Some(env_file) = details.get("env_file").and_then(Value::as_str) {
        println!("  Env file: {env_file}");
    }
    if let Some(appended) = string_list(details, "appended_keys") {
        if !appended.is_empty() {
            println!("  Added: {}", appended.join(", "));
        }
    }
    if let Some(preserved) = string_list(details, "preserved_keys") {
        if !preserved.is_empty() {
            println!("  Kept: {}", preserved.join(", "));
        }
    }
    render_warnings(style, details);
}

fn render_activation(style: &Style, activation: Option<&Value>) {
    if let Some(activation) = activation.and_then(Value::as_str) {
        let line = format!("  Activate with: {activation}");
        println!("{}", style.info(&line));
    }
}

fn render_warnings(style: &Style, details: &Value) {
    if let Some(warnings) = string_list(details, "warnings") {
        for warning in warnings {
            let line = format!("  Warning: {warning}");
            println!("{}", style.info(&line));
        }
    }
}

fn stage_line(style: &Style, label: &str, stage: Option<&Value>) -> Option<String> {
    let stage = stage?;
    let status = stage.get("status").and_then(Value::as_str)?;
    let message = stage.get("message").and_then(Value::as_str)?;
    Some(style.stage(status, &format!("{label}: {message}")))
}

fn string_list<'a>(details: &'a Value, key: &str) -> Option<Vec<&'a str>> {
    Some(
        details
            .get(key)?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .collect(),
    )
}

fn command_group(command: &Command) -> CommandGroup {
    match command {
        Command::Init(_) => CommandGroup::Init,
        Command::Detect(_) => CommandGroup::Detect,
        Command::CreateVenv(_) => CommandGroup::CreateVenv,
        Command::CreateDotenv(_) => CommandGroup::CreateDotenv,
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "envwizard",
    author,
    version,
    about = "Python environment bootstrap in one command",
    long_about = "Detects frameworks from manifests and project layout, then prepares a \
virtualenv, installs dependencies, and writes framework-aware .env files.",
    after_help = "Examples:\n  envwizard init\n  envwizard detect --path ../api\n  envwizard --json create-dotenv"
)]
struct WizardCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    trace: bool,
    #[arg(long, help = "Force debug logging")]
    debug: bool,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes")]
    json: bool,
    #[arg(long, help = "Disable colored human output")]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(
        about = "Detect frameworks, then create the venv, install dependencies, and write dotenv files.",
        override_usage = "envwizard init [--path DIR] [--venv-name NAME] [--python VERSION] [--yes]",
        after_help = "Examples:\n  envwizard init\n  envwizard init --path ../api --venv-name .venv --yes\n"
    )]
    Init(InitArgs),
    #[command(
        about = "Scan a project and report detected frameworks without changing files.",
        override_usage = "envwizard detect [--path DIR]",
        after_help = "Examples:\n  envwizard detect\n  envwizard --json detect --path ../api\n"
    )]
    Detect(PathArgs),
    #[command(
        name = "create-venv",
        about = "Create a virtual environment without the rest of the workflow.",
        override_usage = "envwizard create-venv [--path DIR] [--name NAME] [--python VERSION]",
        after_help = "Examples:\n  envwizard create-venv\n  envwizard create-venv --name .venv --python 3.12\n"
    )]
    CreateVenv(CreateVenvArgs),
    #[command(
        name = "create-dotenv",
        about = "Write or update .env and .env.example from detected frameworks.",
        override_usage = "envwizard create-dotenv [--path DIR]",
        after_help = "Examples:\n  envwizard create-dotenv\n  envwizard --json create-dotenv --path ../api\n"
    )]
    CreateDotenv(PathArgs),
}

#[derive(Args, Debug)]
struct PathArgs {
    #[arg(
        long,
        value_parser = value_parser!(PathBuf),
        help = "Project directory (defaults to the working directory)"
    )]
    path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(
        long,
        value_parser = value_parser!(PathBuf),
        help = "Project directory (defaults to the working directory)"
    )]
    path: Option<PathBuf>,
    #[arg(
        long = "venv-name",
        value_name = "NAME",
        default_value = "venv",
        help = "Directory name for the virtual environment"
    )]
    venv_name: String,
    #[arg(long = "no-install", help = "Skip dependency installation")]
    no_install: bool,
    #[arg(long = "no-dotenv", help = "Skip .env and .env.example generation")]
    no_dotenv: bool,
    #[arg(long, value_name = "VERSION", help = "Python version to use (e.g. 3.12)")]
    python: Option<String>,
    #[arg(short, long, help = "Skip the confirmation prompt")]
    yes: bool,
}

#[derive(Args, Debug)]
struct CreateVenvArgs {
    #[arg(
        long,
        value_parser = value_parser!(PathBuf),
        help = "Project directory (defaults to the working directory)"
    )]
    path: Option<PathBuf>,
    #[arg(
        long,
        value_name = "NAME",
        default_value = "venv",
        help = "Directory name for the virtual environment"
    )]
    name: String,
    #[arg(long, value_name = "VERSION", help = "Python version to use (e.g. 3.12)")]
    python: Option<String>,
}
