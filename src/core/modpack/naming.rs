/// Repository-safe name: ASCII letters, digits, hyphens. Case is preserved.
pub fn slugify(title: &str) -> String {
    let replaced = title.replace('&', "and");
    let mut slug = String::with_capacity(replaced.len());
    let mut pending_dash = false;

    for c in replaced.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `Add <root>` or `Add <root> and N dependencies`.
pub fn add_commit_message(titles: &[String]) -> String {
    match titles {
        [] => "Add mods".to_string(),
        [only] => format!("Add {only}"),
        [root, rest @ ..] => format!("Add {root} and {} dependencies", rest.len()),
    }
}

pub fn add_summary(titles: &[String]) -> String {
    match titles {
        [] => "Nothing to add".to_string(),
        [only] => format!("Successfully added {only}"),
        [root, rest @ ..] => format!(
            "Successfully added {root} and {} dependencies ({})",
            rest.len(),
            rest.join(", ")
        ),
    }
}
