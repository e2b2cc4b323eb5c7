use payplan_core::cli::shell::run_cli;

fn main() {
    payplan_core::init();

    if let Err(err) = run_cli() {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
