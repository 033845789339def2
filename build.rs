use clap::Shell;
use std::{env, path::PathBuf};

#[path = "src/cli.rs"]
mod cli;

fn main() {
    let mut cli = cli::generate_cli();
    let mut out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    out_dir.pop();
    out_dir.pop();
    out_dir.pop();

    cli.gen_completions("droid-triage", Shell::Bash, &out_dir);
    cli.gen_completions("droid-triage", Shell::Fish, &out_dir);
    cli.gen_completions("droid-triage", Shell::Zsh, out_dir);
}
