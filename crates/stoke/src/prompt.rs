//! Interactive yes/no prompt for the alternate-port flow.

use std::io::{self, Write};

use console::{style, Term};

/// Ask whether to run on another port. Pressing Enter counts as yes.
pub fn confirm_port_change(default_port: u16, occupant: Option<&str>) -> io::Result<bool> {
    let mut warning = format!("Something is already running on port {default_port}.");
    if let Some(occupant) = occupant {
        warning.push_str(&format!(" Probably:\n  {occupant}"));
    }
    println!("{}", style(warning).yellow());
    println!();

    print!("Would you like to run the app on another port instead? [Y/n] ");
    io::stdout().flush()?;

    let answer = Term::stdout().read_line()?;
    Ok(parse_confirmation(&answer))
}

/// Empty input counts as confirmation.
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_defaults_to_yes() {
        assert!(parse_confirmation(""));
        assert!(parse_confirmation("  \n"));
    }

    #[test]
    fn accepts_yes_variants() {
        assert!(parse_confirmation("y"));
        assert!(parse_confirmation("Y"));
        assert!(parse_confirmation("Yes"));
    }

    #[test]
    fn anything_else_declines() {
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("no"));
        assert!(!parse_confirmation("maybe"));
    }
}
