use crate::error::Error;
use crate::span::Span;

pub fn render(source: &str, kind: &str, span: Span, message: &str, hint: Option<&str>) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = span.line.saturating_sub(1);
    let source_line = lines.get(line_idx).unwrap_or(&"");

    let line_num = span.line.to_string();
    let gutter_width = line_num.len();

    let pointer_col = span.col.saturating_sub(1);
    let pointer_len = span.length.max(1);

    let mut out = String::new();

    // error[kind]: message
    out.push_str(&format!("error[{}]: {}\n", kind, message));

    // --> line:col
    out.push_str(&format!(
        "{:>width$}--> line {}:{}\n",
        " ",
        span.line,
        span.col,
        width = gutter_width
    ));

    out.push_str(&format!("{:>width$} |\n", " ", width = gutter_width));

    out.push_str(&format!(
        "{:>width$} | {}\n",
        span.line,
        source_line,
        width = gutter_width
    ));

    // pointer line; wide (CJK) chars take two terminal columns
    let padding: String = source_line
        .chars()
        .take(pointer_col)
        .map(|c| match c {
            '\t' => "\t",
            c if is_wide(c) => "  ",
            _ => " ",
        })
        .collect();
    let pointed_width: usize = source_line
        .chars()
        .skip(pointer_col)
        .take(pointer_len)
        .map(|c| if is_wide(c) { 2 } else { 1 })
        .sum();
    let carets = "^".repeat(pointed_width.max(1));
    out.push_str(&format!(
        "{:>width$} | {}{}\n",
        " ",
        padding,
        carets,
        width = gutter_width
    ));

    if let Some(hint) = hint {
        out.push_str(&format!("{:>width$} |\n", " ", width = gutter_width));
        out.push_str(&format!(
            "{:>width$} = hint: {}\n",
            " ",
            hint,
            width = gutter_width
        ));
    }

    out
}

/// Renders a pipeline error against the source it came from.
pub fn report(source: &str, error: &Error) -> String {
    let hint = suggest_hint(error.message());
    render(
        source,
        error.stage(),
        error.span(),
        error.message(),
        hint.as_deref(),
    )
}

pub fn suggest_hint(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("cannot assign to constant") {
        return Some("declare it with 变量 instead of 常量 to make it assignable".into());
    }

    if msg.contains("cannot assign to undefined variable") || msg.contains("undefined variable")
    {
        return Some("declare it first, e.g. 变量 名字 = 0;".into());
    }

    if msg.contains("already defined in this scope") {
        return Some("drop the 变量 keyword to assign to the existing variable".into());
    }

    if msg.contains("type mismatch") && msg.contains("string") {
        return Some("strings only combine with '+', which joins both sides as text".into());
    }

    if msg.contains("undefined function") {
        return Some("declare it with 函数 before calling it".into());
    }

    if msg.contains("unclosed block") {
        return Some("add the missing '}'".into());
    }

    if msg.contains("expected ';'") {
        return Some("every statement ends with ';'".into());
    }

    None
}

// East Asian wide ranges that matter for this language's source text.
fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}
