//! Generated-output production for Weft templates.
//!
//! A template is translated line by line into the class the host compiler
//! would see: `@using` directives become `using` statements, markup becomes
//! `WriteLiteral` calls, `@expr` inline expressions become `Write` calls, and
//! `@{ ... }` blocks pass through as code. Auto-insertion providers never read
//! the raw template through any other door; they get this output (and the
//! snapshot it rides on) from the document gate.

use ropey::Rope;

const GENERATED_HEADER: &str = "// <auto-generated/>";
const TEMPLATE_CLASS: &str = "public class GeneratedTemplate : TemplateBase";

/// Result of translating a Weft template into generated host code.
///
/// `supported` is false when the template cannot be generated (currently: an
/// unterminated `@{` code block). Consumers must treat unsupported output the
/// same as a missing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub text: String,
    pub supported: bool,
}

impl GeneratedOutput {
    fn unsupported() -> Self {
        GeneratedOutput {
            text: String::new(),
            supported: false,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        !self.supported
    }
}

/// Translates a template into its generated output.
pub fn generate(source: &Rope) -> GeneratedOutput {
    let mut usings: Vec<String> = Vec::new();
    let mut body: Vec<String> = Vec::new();
    let mut code_depth: usize = 0;

    for line in source.lines() {
        let line = line.to_string();
        let trimmed = line.trim();

        if code_depth > 0 {
            let (code, rest, depth) = take_code(trimmed, code_depth);
            code_depth = depth;
            if !code.is_empty() {
                body.push(code);
            }
            if let Some(rest) = rest {
                if !rest.is_empty() {
                    emit_markup(&rest, &mut body);
                }
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("@using ") {
            let namespace = rest.trim().trim_end_matches(';').trim();
            if !namespace.is_empty() {
                usings.push(format!("using {};", namespace));
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("@{") {
            let (code, after, depth) = take_code(rest, 1);
            code_depth = depth;
            if !code.is_empty() {
                body.push(code);
            }
            if let Some(after) = after {
                if !after.is_empty() {
                    emit_markup(&after, &mut body);
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        emit_markup(trimmed, &mut body);
    }

    if code_depth > 0 {
        return GeneratedOutput::unsupported();
    }

    let mut text = String::new();
    text.push_str(GENERATED_HEADER);
    text.push('\n');
    for using in &usings {
        text.push_str(using);
        text.push('\n');
    }
    text.push_str(TEMPLATE_CLASS);
    text.push_str("\n{\n    public override void Execute()\n    {\n");
    for statement in &body {
        text.push_str("        ");
        text.push_str(statement);
        text.push('\n');
    }
    text.push_str("    }\n}\n");

    GeneratedOutput { text, supported: true }
}

/// Consumes code text until the brace that closes the current block.
///
/// Returns the consumed code, the remainder of the line past the closing
/// brace (when the block closed on this line), and the new nesting depth.
fn take_code(text: &str, mut depth: usize) -> (String, Option<String>, usize) {
    let mut code = String::new();
    for (index, c) in text.char_indices() {
        match c {
            '{' => {
                depth += 1;
                code.push(c);
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let rest = text[index + 1..].trim().to_string();
                    return (code.trim().to_string(), Some(rest), 0);
                }
                code.push(c);
            }
            _ => code.push(c),
        }
    }
    (code.trim().to_string(), None, depth)
}

/// Splits a markup line into `WriteLiteral` chunks and `Write` calls for
/// `@identifier` expressions. `@@` escapes a literal `@`.
fn emit_markup(line: &str, body: &mut Vec<String>) {
    let mut literal = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '@' {
            literal.push(c);
            continue;
        }
        match chars.peek() {
            Some('@') => {
                literal.push('@');
                chars.next();
            }
            Some(next) if next.is_ascii_alphabetic() || *next == '_' => {
                let mut expression = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == '.' {
                        expression.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // A trailing dot belongs to the surrounding markup, not the
                // expression.
                let mut trailing = String::new();
                while expression.ends_with('.') {
                    expression.pop();
                    trailing.push('.');
                }
                flush_literal(&mut literal, body);
                body.push(format!("Write({});", expression));
                literal.push_str(&trailing);
            }
            _ => literal.push('@'),
        }
    }
    flush_literal(&mut literal, body);
}

fn flush_literal(literal: &mut String, body: &mut Vec<String>) {
    if literal.is_empty() {
        return;
    }
    body.push(format!("WriteLiteral(\"{}\");", escape_literal(literal)));
    literal.clear();
}

fn escape_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
