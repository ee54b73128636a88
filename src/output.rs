use owo_colors::OwoColorize;

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when output is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix). Used for narration and status
/// blocks, which users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Multi-line directory status block; the `===` header is highlighted on a TTY.
pub fn print_status(block: &str) {
    for line in block.lines() {
        if is_tty() && line.starts_with("===") {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
}

/// Loud closing line for the unrecoverable case.
pub fn print_banner(msg: &str) {
    if is_tty() {
        eprintln!("{}", format!("!!! {msg} !!!").red().bold());
    } else {
        eprintln!("!!! {msg} !!!");
    }
}
