use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn banner() {
    let text_content: String = format!("⟦ NETSURVEY v{} ⟧", env!("CARGO_PKG_VERSION"));
    let text_width: usize = UnicodeWidthStr::width(text_content.as_str());
    let side: usize = TOTAL_WIDTH.saturating_sub(text_width) / 2;
    let text: ColoredString = text_content.bright_green().bold();
    let sep: ColoredString = "═".repeat(side).bright_black();
    print(&format!("{sep}{text}{sep}"));
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {msg} ⟧");
    let msg_len: usize = UnicodeWidthStr::width(formatted.as_str());

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: String = format!(
        "{}{}{}",
        "─".repeat(left).bright_black(),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right).bright_black()
    );
    print(&line);
}

pub fn fat_separator() {
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix: ColoredString = ">".color(colors::SEPARATOR);
    print(&format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT)));
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().color(colors::ACCENT));
    print(&format!(
        "{} {}",
        idx_str.color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    ));
}

/// Prints `key ....: value` rows as the branches of the last tree head, with
/// the dots padding every key to the widest one.
pub fn as_tree_one_level(key_value_pair: Vec<(String, ColoredString)>) {
    let key_width: usize = key_value_pair
        .iter()
        .map(|(key, _)| UnicodeWidthStr::width(key.as_str()))
        .max()
        .unwrap_or(0);

    for (i, (key, value)) in key_value_pair.iter().enumerate() {
        let last: bool = i + 1 == key_value_pair.len();
        let branch: ColoredString = if last { "└─".bright_black() } else { "├─".bright_black() };
        let dots: String = ".".repeat(key_width + 1 - UnicodeWidthStr::width(key.as_str()));
        print(&format!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            dots.color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        ));
    }
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{space}{msg}"));
}

const NO_RESULTS: &str = r#"
         _   _  ___    ____  _____ ____  _   _ _   _____ ____
        | \ | |/ _ \  |  _ \| ____/ ___|| | | | | |_   _/ ___|
        |  \| | | | | | |_) |  _| \___ \| | | | |   | | \___ \
        | |\  | |_| | |  _ <| |___ ___) | |_| | |___| |  ___) |
        |_| \_|\___/  |_| \_\_____|____/ \___/|_____|_| |____/
"#;

pub fn no_results() {
    print(&NO_RESULTS.red().bold().to_string());
}
