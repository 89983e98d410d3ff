use std::path::Path;

struct CommentStyle {
    line: &'static [&'static str],
    block: Option<(&'static str, &'static str)>,
}

fn comment_style(file_path: &str) -> CommentStyle {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "py" | "rb" | "sh" | "yml" | "yaml" | "toml" => CommentStyle {
            line: &["#"],
            block: None,
        },
        "sql" | "lua" => CommentStyle {
            line: &["--"],
            block: Some(("/*", "*/")),
        },
        _ => CommentStyle {
            line: &["//"],
            block: Some(("/*", "*/")),
        },
    }
}

/// Count non-blank, non-comment lines of `source`, picking comment syntax from the path
pub fn count_lines_of_code(source: &str, file_path: &str) -> u32 {
    let style = comment_style(file_path);
    let mut in_block_comment = false;
    let mut code = 0;

    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if in_block_comment {
            if let Some((_, end)) = style.block {
                if let Some(index) = trimmed.find(end) {
                    in_block_comment = false;
                    // code after the closing marker still counts
                    if !trimmed[index + end.len()..].trim().is_empty() {
                        code += 1;
                    }
                }
            }
            continue;
        }

        if style.line.iter().any(|prefix| trimmed.starts_with(prefix)) {
            continue;
        }

        if let Some((start, end)) = style.block {
            if let Some(rest) = trimmed.strip_prefix(start) {
                if !rest.contains(end) {
                    in_block_comment = true;
                }
                continue;
            }
        }

        code += 1;
    }

    code
}
