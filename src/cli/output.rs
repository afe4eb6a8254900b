use owo_colors::OwoColorize;

pub struct Output;

impl Output {
    pub const CHECK: &'static str = "✓";
    pub const CROSS: &'static str = "✗";

    pub fn success(message: &str) {
        println!("{} {}", Self::CHECK.green().bold(), message);
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", Self::CROSS.red().bold(), message.red());
    }

    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message.bright_blue());
    }

    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    pub fn header(message: &str) {
        println!("\n{}\n", message.bright_cyan().bold());
    }

    /// Raw rebuild output, framed so it stands apart from our own messages.
    pub fn captured(command: &str, text: &str) {
        Self::header(&format!("Output of {}", command));
        println!("{}", text.trim_end());
        println!();
    }
}
