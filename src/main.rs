use clap::Parser;
use git_blamebot::commands::blamebot_handlers;

#[derive(Parser)]
#[command(name = "git-blamebot")]
#[command(about = "line attribution for automated edits", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Command and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = blamebot_handlers::handle_blamebot(&cli.args);
    std::process::exit(exit_code);
}
