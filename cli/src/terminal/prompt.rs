use anyhow::Context;
use console::Term;
use edgemap_common::network::device::Credentials;

/// Asks for whatever part of the credentials was not given on the command line.
/// The password is never echoed.
pub fn credentials(username: Option<&str>) -> anyhow::Result<Credentials> {
    let term = Term::stderr();

    let username = match username {
        Some(name) => name.to_string(),
        None => {
            term.write_str("Username: ")?;
            term.read_line().context("reading username")?.trim().to_string()
        }
    };
    anyhow::ensure!(!username.is_empty(), "a username is required");

    term.write_str("Password: ")?;
    let password = term.read_secure_line().context("reading password")?;

    Ok(Credentials::new(username, password))
}

/// `[y/N]` question; only `y` or `yes` counts as consent.
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{question} [y/N] "))?;
    let answer = term.read_line().context("reading answer")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
