use std::io;
use std::path::Path;

use crossterm::style::Stylize;
use crossterm::tty::IsTty;

/// Render `[<cwd>]$ `, bold blue when `color` is set. A `None` cwd (the
/// working directory could not be read) renders as `?`.
pub fn render(cwd: Option<&Path>, color: bool) -> String {
    let location = match cwd {
        Some(path) => format!("[{}]", path.display()),
        None => "[?]".to_string(),
    };
    if color {
        format!("{}$ ", location.blue().bold())
    } else {
        format!("{location}$ ")
    }
}

/// Color only when a person is looking at the output.
pub fn color_enabled() -> bool {
    io::stdout().is_tty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prompt_shows_directory() {
        assert_eq!(render(Some(Path::new("/tmp")), false), "[/tmp]$ ");
    }

    #[test]
    fn unknown_directory() {
        assert_eq!(render(None, false), "[?]$ ");
    }

    #[test]
    fn colored_prompt_keeps_directory_and_marker() {
        let prompt = render(Some(Path::new("/home")), true);
        assert!(prompt.contains("[/home]"));
        assert!(prompt.ends_with("$ "));
    }
}
