//! Term text rendering
//!
//! `Display` for [`Term`] produces the quoted, canonical text an engine can
//! read back: atoms are quoted when needed, lists use bracket notation and
//! every other compound is written in functional notation.

use std::fmt::{self, Write};

use crate::error::{PlError, PlResult};
use crate::term::Term;

/// Placeholder marker for positional literal arguments
pub const PLACEHOLDER: char = '?';

const SYMBOL_CHARS: &str = "+-*/\\^<>=~:.?@#&$";

fn is_symbol_char(c: char) -> bool {
    SYMBOL_CHARS.contains(c)
}

fn is_solo_atom(s: &str) -> bool {
    matches!(s, "[]" | "{}" | "!" | ";")
}

fn is_letter_digit_atom(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_symbol_atom(s: &str) -> bool {
    !s.is_empty() && s != "." && !s.starts_with("/*") && s.chars().all(is_symbol_char)
}

/// Whether `s` must be quoted to read back as the same atom
pub fn atom_needs_quotes(s: &str) -> bool {
    !(is_solo_atom(s) || is_letter_digit_atom(s) || is_symbol_atom(s))
}

/// Write `s` as an atom, quoting and escaping when required
pub fn write_atom<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    if !atom_needs_quotes(s) {
        return out.write_str(s);
    }
    out.write_char('\'')?;
    for c in s.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '\'' => out.write_str("\\'")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('\'')
}

fn write_float<W: Write>(out: &mut W, f: f64) -> fmt::Result {
    if f.is_nan() {
        return out.write_str("nan");
    }
    if f.is_infinite() {
        return out.write_str(if f > 0.0 { "inf" } else { "-inf" });
    }
    let repr = format!("{:?}", f);
    match repr.find('e') {
        // Prolog floats need a fraction before the exponent
        Some(pos) if !repr[..pos].contains('.') => {
            write!(out, "{}.0{}", &repr[..pos], &repr[pos..])
        }
        _ => out.write_str(&repr),
    }
}

fn write_list<W: Write>(out: &mut W, term: &Term) -> fmt::Result {
    out.write_char('[')?;
    let mut cursor = term;
    let mut first = true;
    while let Some((head, tail)) = cursor.as_cons() {
        if !first {
            out.write_char(',')?;
        }
        first = false;
        write_term(out, head)?;
        cursor = tail;
    }
    if !cursor.is_nil() {
        out.write_char('|')?;
        write_term(out, cursor)?;
    }
    out.write_char(']')
}

fn write_term<W: Write>(out: &mut W, term: &Term) -> fmt::Result {
    match term {
        Term::Atom(a) => write_atom(out, a),
        Term::Integer(i) => write!(out, "{}", i),
        Term::Float(f) => write_float(out, *f),
        Term::Variable(name) => out.write_str(name),
        Term::Compound { .. } if term.as_cons().is_some() => write_list(out, term),
        Term::Compound { functor, args } => {
            write_atom(out, functor)?;
            if args.is_empty() {
                return Ok(());
            }
            out.write_char('(')?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_term(out, arg)?;
            }
            out.write_char(')')
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self)
    }
}

/// Splice the text of `args` into the placeholders of `goal`, left to right.
///
/// A placeholder is a lone `?` outside quoted text; `?` that is part of a
/// longer symbol-char token (such as `?-`) is left alone. The number of
/// placeholders must match the number of arguments.
pub fn bind_placeholders(goal: &str, args: &[Term]) -> PlResult<String> {
    let chars: Vec<char> = goal.chars().collect();
    let mut out = String::with_capacity(goal.len() + args.len() * 8);
    let mut quote: Option<char> = None;
    let mut next_arg = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == '\\' && i + 1 < chars.len() {
                    out.push(chars[i + 1]);
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    // 0'c character codes are not quoted text
                    let char_code = c == '\''
                        && i > 0
                        && chars[i - 1] == '0'
                        && (i < 2 || !chars[i - 2].is_ascii_alphanumeric());
                    out.push(c);
                    if char_code {
                        if i + 1 < chars.len() {
                            out.push(chars[i + 1]);
                            if chars[i + 1] == '\\' && i + 2 < chars.len() {
                                out.push(chars[i + 2]);
                                i += 1;
                            }
                            i += 1;
                        }
                    } else {
                        quote = Some(c);
                    }
                }
                PLACEHOLDER
                    if (i == 0 || !is_symbol_char(chars[i - 1]))
                        && (i + 1 == chars.len() || !is_symbol_char(chars[i + 1])) =>
                {
                    let arg = args.get(next_arg).ok_or_else(|| {
                        PlError::submission(
                            goal,
                            format!("more placeholders than the {} arguments given", args.len()),
                        )
                    })?;
                    write!(out, "{}", arg).map_err(|e| PlError::submission(goal, e))?;
                    next_arg += 1;
                }
                c => out.push(c),
            },
        }
        i += 1;
    }

    if next_arg != args.len() {
        return Err(PlError::submission(
            goal,
            format!(
                "{} placeholders for {} arguments",
                next_arg,
                args.len()
            ),
        ));
    }
    Ok(out)
}
