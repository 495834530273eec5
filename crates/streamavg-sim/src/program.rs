//! Simulated program build.
//!
//! The simulator does not compile OpenCL C. It checks that the source is
//! well-formed enough to declare the two kernels the engine needs, with the
//! expected argument counts, and produces a build log otherwise.

use std::collections::HashMap;

use streamavg_core::error::{Result, StreamAvgError};
use streamavg_core::kernels::{FILL_ZERO_KERNEL, UPDATE_KERNEL};

/// Argument counts required by the engine.
const REQUIRED_KERNELS: [(&str, usize); 2] = [(FILL_ZERO_KERNEL, 1), (UPDATE_KERNEL, 3)];

/// Kernel declaration found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSignature {
    /// Kernel name.
    pub name: String,
    /// Declared parameters, whitespace-normalized.
    pub params: Vec<String>,
}

/// A "built" simulated program.
#[derive(Debug, Clone)]
pub struct SimProgram {
    kernels: HashMap<String, KernelSignature>,
}

impl SimProgram {
    /// Validate `source` and extract kernel declarations.
    pub fn build(source: &str) -> Result<Self> {
        let mut log = Vec::new();

        if source.trim().is_empty() {
            log.push("error: program source is empty".to_string());
        }
        let code = strip_comments(source, &mut log);
        check_balanced(&code, &mut log);

        let kernels: HashMap<String, KernelSignature> = parse_kernels(&code)
            .into_iter()
            .map(|k| (k.name.clone(), k))
            .collect();

        for (name, arity) in REQUIRED_KERNELS {
            match kernels.get(name) {
                None => log.push(format!("error: kernel '{}' is not declared", name)),
                Some(sig) if sig.params.len() != arity => log.push(format!(
                    "error: kernel '{}' takes {} argument(s), expected {}",
                    name,
                    sig.params.len(),
                    arity
                )),
                Some(_) => {}
            }
        }

        if !log.is_empty() {
            return Err(StreamAvgError::CompilationFailure {
                kernel_log: log.join("\n"),
            });
        }

        Ok(Self { kernels })
    }

    /// Look up a kernel by name.
    pub fn kernel(&self, name: &str) -> Option<&KernelSignature> {
        self.kernels.get(name)
    }

    /// Number of kernels declared in the source.
    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }
}

/// Blank out comments and the contents of string and character literals.
///
/// Newlines are kept so diagnostics still point at the original line.
fn strip_comments(source: &str, log: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut line_no = 1;

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let opened_at = line_no;
                let mut prev = ' ';
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '\n' {
                        out.push('\n');
                        line_no += 1;
                    }
                    if prev == '*' && n == '/' {
                        closed = true;
                        break;
                    }
                    prev = n;
                }
                if !closed {
                    log.push(format!("{}: error: unterminated comment", opened_at));
                }
                out.push(' ');
            }
            '"' | '\'' => {
                out.push(c);
                let mut escaped = false;
                for n in chars.by_ref() {
                    if n == '\n' {
                        out.push('\n');
                        line_no += 1;
                        break;
                    }
                    if escaped {
                        escaped = false;
                    } else if n == '\\' {
                        escaped = true;
                    } else if n == c {
                        out.push(c);
                        break;
                    }
                }
            }
            '\n' => {
                out.push(c);
                line_no += 1;
            }
            _ => out.push(c),
        }
    }

    out
}

fn check_balanced(source: &str, log: &mut Vec<String>) {
    let mut stack = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' | '(' | '[' => stack.push((c, line_no + 1)),
                '}' | ')' | ']' => {
                    let open = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((o, _)) if o == open => {}
                        _ => {
                            log.push(format!("{}: error: unexpected '{}'", line_no + 1, c));
                            return;
                        }
                    }
                }
                _ => {}
            }
        }
    }
    if let Some((c, line_no)) = stack.pop() {
        log.push(format!("{}: error: unclosed '{}'", line_no, c));
    }
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte range of the next `kernel` or `__kernel` qualifier in `source`.
fn find_kernel_qualifier(source: &str) -> Option<(usize, usize)> {
    source.match_indices("kernel").find_map(|(pos, word)| {
        let start = if source[..pos].ends_with("__") { pos - 2 } else { pos };
        let end = pos + word.len();
        let before = source[..start].chars().next_back();
        let after = source[end..].chars().next();
        if before.is_some_and(is_ident) || after.is_some_and(is_ident) {
            None
        } else {
            Some((start, end))
        }
    })
}

fn parse_kernels(source: &str) -> Vec<KernelSignature> {
    let mut kernels = Vec::new();
    let mut rest = source;

    while let Some((_, end)) = find_kernel_qualifier(rest) {
        rest = &rest[end..];
        let decl = rest.trim_start();
        let Some(decl) = decl.strip_prefix("void") else {
            continue;
        };
        let Some(open) = decl.find('(') else {
            continue;
        };
        let Some(close) = decl[open..].find(')') else {
            continue;
        };

        let name = decl[..open].trim().to_string();
        let params = decl[open + 1..open + close]
            .split(',')
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| !p.is_empty() && p != "void")
            .collect();

        kernels.push(KernelSignature { name, params });
    }

    kernels
}
