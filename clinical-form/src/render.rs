//! Plain-terminal rendering of the lightweight markup the service returns.

const BULLET: &str = "•";

pub fn to_terminal(markup: &str) -> String {
    let mut lines = Vec::new();

    for line in markup.lines() {
        let line = strip_emphasis(line);
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];

        if let Some(title) = heading_text(trimmed) {
            lines.push(title.to_string());
            lines.push("─".repeat(title.chars().count()));
        } else if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            lines.push(format!("{indent}{BULLET} {item}"));
        } else {
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    line[hashes..]
        .strip_prefix(' ')
        .map(str::trim)
        .filter(|title| !title.is_empty())
}

fn strip_emphasis(line: &str) -> String {
    line.replace("**", "").replace("__", "")
}
