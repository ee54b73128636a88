mod app;
mod logging;

fn main() {
    let args = junction_move::cli::parse();
    let code = match app::run(args) {
        Ok(code) => code,
        Err(e) => {
            junction_move::output::print_error(&format!("{e:#}"));
            1
        }
    };
    std::process::exit(code);
}
