//! Rust code generation for parsed alpha formulas
//!
//! The generator emits source text targeting the `ExecContext` dispatcher:
//! field reads become `ctx.field("KEY")?`, uppercase DSL calls are routed
//! through an alias table onto snake_case context methods, `^` becomes
//! `ctx.power(..)?`, comparisons/logic/ternary become the corresponding
//! context methods, and plain arithmetic stays infix on `&Series`
//! references. Numeric literals are normalized to f64 spelling; a numeric
//! operand in a series position is wrapped in `ctx.constant(..)`.
//!
//! Two output shapes, mirroring the transpiler this replaces:
//! - function form: `pub fn NAME(ctx: &ExecContext) -> Result<Series>`
//! - variable form: `let NAME = ...;` assuming an ambient `ctx` inside a
//!   fallible function
//!
//! In function form, a field read more than once is hoisted into a local so
//! repeated reads are observably the same value.

use crate::ast::{BinOp, Expr};
use crate::parser::parse;
use alpha_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Knobs for [`to_rust`].
pub struct CompileOptions<'a> {
    /// Emit a function (true) or a `let` binding (false).
    pub as_function: bool,
    /// Hoist repeatedly-read fields into locals (function form only).
    pub hoist: bool,
    /// Identifier-to-field-key transform, e.g. upper-casing.
    pub name_transform: Option<&'a dyn Fn(&str) -> String>,
}

impl Default for CompileOptions<'_> {
    fn default() -> Self {
        CompileOptions {
            as_function: true,
            hoist: true,
            name_transform: None,
        }
    }
}

/// Compile one formula into Rust source text.
pub fn to_rust(name: &str, source: &str, options: &CompileOptions<'_>) -> Result<String> {
    let expr = parse(source)?;
    let mut counts = BTreeMap::new();
    collect_fields(&expr, options.name_transform, &mut counts);
    debug!(formula = name, fields = counts.len(), "compiling alpha formula");

    let mut locals = BTreeMap::new();
    if options.as_function && options.hoist {
        for (key, count) in &counts {
            if *count > 1 {
                locals.insert(key.clone(), local_ident(key));
            }
        }
    }

    let emitter = Emitter {
        locals: &locals,
        transform: options.name_transform,
    };
    let body = emitter.emit(&expr)?;

    if options.as_function {
        let mut lines = Vec::new();
        lines.push(format!("pub fn {name}(ctx: &ExecContext) -> Result<Series> {{"));
        for (key, local) in &locals {
            lines.push(format!("    let {local} = ctx.field(\"{key}\")?;"));
        }
        let result = match body.kind {
            Kind::Scalar => format!("ctx.constant({})", body.text),
            Kind::Value => body.text,
        };
        lines.push(format!("    Ok({result})"));
        lines.push("}".to_string());
        Ok(lines.join("\n"))
    } else {
        Ok(format!("let {name} = {};", body.text))
    }
}

/// Compile a list of formulas into one module: a `use` header, then one
/// commented function per formula, auto-numbered `prefix001...` with
/// zero-padding wide enough for the count.
pub fn compile_module(
    sources: &[&str],
    prefix: &str,
    options: &CompileOptions<'_>,
) -> Result<String> {
    let width = sources.len().to_string().len();
    let mut out = String::from("use alphalib::{ExecContext, Result, Series};\n");
    for (i, source) in sources.iter().enumerate() {
        let name = format!("{prefix}{:0width$}", i + 1);
        let function = to_rust(
            &name,
            source,
            &CompileOptions {
                as_function: true,
                hoist: options.hoist,
                name_transform: options.name_transform,
            },
        )?;
        out.push_str("\n// ");
        out.push_str(source);
        out.push('\n');
        out.push_str(&function);
        out.push('\n');
    }
    Ok(out)
}

/// The data fields a formula reads, after the name transform, sorted and
/// deduplicated.
pub fn referenced_fields(
    source: &str,
    name_transform: Option<&dyn Fn(&str) -> String>,
) -> Result<Vec<String>> {
    let expr = parse(source)?;
    let mut counts = BTreeMap::new();
    collect_fields(&expr, name_transform, &mut counts);
    Ok(counts.into_keys().collect())
}

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    /// Plain f64 expression.
    Scalar,
    /// Series-valued expression.
    Value,
}

struct Piece {
    text: String,
    kind: Kind,
}

impl Piece {
    fn scalar(text: String) -> Self {
        Piece {
            text,
            kind: Kind::Scalar,
        }
    }

    fn value(text: String) -> Self {
        Piece {
            text,
            kind: Kind::Value,
        }
    }

    /// Render as a `&Series` argument; scalars broadcast via the context.
    fn as_series_ref(&self) -> String {
        match self.kind {
            Kind::Scalar => format!("&ctx.constant({})", self.text),
            Kind::Value => format!("&{}", self.text),
        }
    }

    /// Render as an infix operand (`&Series` ref or bare f64).
    fn as_operand(&self) -> String {
        match self.kind {
            Kind::Scalar => self.text.clone(),
            Kind::Value => format!("&{}", self.text),
        }
    }
}

struct Emitter<'a> {
    locals: &'a BTreeMap<String, String>,
    transform: Option<&'a dyn Fn(&str) -> String>,
}

impl Emitter<'_> {
    fn emit(&self, expr: &Expr) -> Result<Piece> {
        match expr {
            Expr::Number(raw) => Ok(Piece::scalar(number_literal(raw))),
            Expr::Name(name) => Ok(self.field(&self.field_key(name))),
            Expr::Dotted(parts) => Ok(self.field(&self.field_key(&parts.join(".")))),
            Expr::Neg(inner) => {
                let p = self.emit(inner)?;
                Ok(match p.kind {
                    Kind::Scalar => Piece::scalar(format!("-{}", p.text)),
                    Kind::Value => Piece::value(format!("(-&{})", p.text)),
                })
            }
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                let c = self.emit(cond)?;
                let a = self.emit(then)?;
                let b = self.emit(otherwise)?;
                Ok(Piece::value(format!(
                    "ctx.select({}, {}, {})?",
                    c.as_series_ref(),
                    a.as_series_ref(),
                    b.as_series_ref()
                )))
            }
            Expr::Call { name, args } => self.call(name, args),
        }
    }

    fn binary(&self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<Piece> {
        let l = self.emit(lhs)?;
        let r = self.emit(rhs)?;
        let infix = |sym: &str| {
            if l.kind == Kind::Scalar && r.kind == Kind::Scalar {
                Piece::scalar(format!("({} {} {})", l.text, sym, r.text))
            } else {
                Piece::value(format!("({} {} {})", l.as_operand(), sym, r.as_operand()))
            }
        };
        let method = |name: &str| {
            Piece::value(format!(
                "ctx.{name}({}, {})?",
                l.as_series_ref(),
                r.as_series_ref()
            ))
        };
        Ok(match op {
            BinOp::Add => infix("+"),
            BinOp::Sub => infix("-"),
            BinOp::Mul => infix("*"),
            BinOp::Div => infix("/"),
            BinOp::Pow => method("power"),
            BinOp::Eq => method("eq"),
            BinOp::Ne => method("ne"),
            BinOp::Lt => method("lt"),
            BinOp::Gt => method("gt"),
            BinOp::Le => method("le"),
            BinOp::Ge => method("ge"),
            BinOp::And => method("and"),
            BinOp::Or => method("or"),
        })
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Piece> {
        let (method, data_args) = resolve_call(name);
        let mut rendered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let piece = self.emit(arg)?;
            if i < data_args {
                rendered.push(piece.as_series_ref());
            } else if piece.kind == Kind::Scalar {
                rendered.push(piece.text);
            } else {
                return Err(Error::unsupported(format!(
                    "argument {} of {name} must be a literal number",
                    i + 1
                )));
            }
        }
        // SCALE's normalization target defaults to 1
        if method == "scale" && rendered.len() == 1 {
            rendered.push("1.0".to_string());
        }
        Ok(Piece::value(format!(
            "ctx.{method}({})?",
            rendered.join(", ")
        )))
    }

    fn field_key(&self, name: &str) -> String {
        match self.transform {
            Some(f) => f(name),
            None => name.to_string(),
        }
    }

    fn field(&self, key: &str) -> Piece {
        match self.locals.get(key) {
            Some(local) => Piece::value(local.clone()),
            None => Piece::value(format!("ctx.field(\"{key}\")?")),
        }
    }
}

fn collect_fields(
    expr: &Expr,
    transform: Option<&dyn Fn(&str) -> String>,
    counts: &mut BTreeMap<String, usize>,
) {
    let mut record = |name: &str| {
        let key = match transform {
            Some(f) => f(name),
            None => name.to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    };
    match expr {
        Expr::Number(_) => {}
        Expr::Name(name) => record(name),
        Expr::Dotted(parts) => record(&parts.join(".")),
        Expr::Neg(inner) => collect_fields(inner, transform, counts),
        Expr::Binary { lhs, rhs, .. } => {
            collect_fields(lhs, transform, counts);
            collect_fields(rhs, transform, counts);
        }
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            collect_fields(cond, transform, counts);
            collect_fields(then, transform, counts);
            collect_fields(otherwise, transform, counts);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_fields(arg, transform, counts);
            }
        }
    }
}

/// Map a DSL function name onto its context method and the number of
/// leading series arguments; the remaining arguments are scalar
/// parameters. Unknown names fall back to snake_case with every argument
/// treated as series data.
fn resolve_call(name: &str) -> (String, usize) {
    let key: String = name
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_lowercase();
    let known: Option<(&str, usize)> = match key.as_str() {
        "ref" | "delay" => Some(("delay", 1)),
        "delta" => Some(("delta", 1)),
        "sum" | "sumac" => Some(("sum", 1)),
        "product" => Some(("product", 1)),
        "sumif" => Some(("sumif", 2)),
        "count" => Some(("count", 1)),
        "ma" | "mean" => Some(("ma", 1)),
        "lwma" | "wma" | "decaylinear" => Some(("lwma", 1)),
        "sma" => Some(("sma", 1)),
        "dma" => Some(("dma", 1)),
        "ema" => Some(("ema", 1)),
        "hhv" | "tsmax" | "highest" => Some(("hhv", 1)),
        "llv" | "tsmin" | "lowest" => Some(("llv", 1)),
        "hhvbars" => Some(("hhvbars", 1)),
        "llvbars" => Some(("llvbars", 1)),
        "tsargmax" => Some(("ts_argmax", 1)),
        "tsargmin" => Some(("ts_argmin", 1)),
        "std" | "stddev" => Some(("stddev", 1)),
        "var" => Some(("var", 1)),
        "cov" | "covariance" => Some(("cov", 2)),
        "corr" | "correlation" => Some(("corr", 2)),
        "regbeta" => Some(("regbeta", 2)),
        "regresi" => Some(("regresi", 2)),
        "slope" => Some(("slope", 1)),
        "intercept" => Some(("intercept", 1)),
        "tscorrelation" => Some(("ts_correlation", 1)),
        "rank" => Some(("rank", 1)),
        "tsrank" => Some(("ts_rank", 1)),
        "bins" => Some(("bins", 1)),
        "barslast" => Some(("barslast", 1)),
        "barssince" => Some(("barssince", 1)),
        "cross" => Some(("cross", 2)),
        "rcross" => Some(("rcross", 2)),
        "longcross" => Some(("longcross", 2)),
        "rlongcross" => Some(("rlongcross", 2)),
        "sumbars" => Some(("sumbars", 1)),
        "neutralize" => Some(("neutralize", 2)),
        "fret" => Some(("fret", 3)),
        "power" | "pow" | "signedpower" => Some(("power", 2)),
        "min" => Some(("min", 2)),
        "max" => Some(("max", 2)),
        "abs" => Some(("abs", 1)),
        "sign" => Some(("sign", 1)),
        "log" => Some(("log", 1)),
        "exp" => Some(("exp", 1)),
        "sqrt" => Some(("sqrt", 1)),
        "scale" => Some(("scale", 1)),
        "sequence" => Some(("sequence", 0)),
        "select" => Some(("select", 3)),
        _ => None,
    };
    match known {
        Some((method, data_args)) => (method.to_string(), data_args),
        None => (snake_case(name), usize::MAX),
    }
}

/// Best-effort snake_case for unknown DSL function names.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Normalize a DSL number spelling into a valid Rust f64 literal.
fn number_literal(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix('.') {
        return format!("0.{rest}");
    }
    if raw.contains(['.', 'e', 'E']) {
        raw.to_string()
    } else {
        format!("{raw}.0")
    }
}

/// Local binding name for a hoisted field key.
fn local_ident(key: &str) -> String {
    let mut s: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if s.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if is_keyword(&s) {
        s.push('_');
    }
    s
}

fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "async" | "await" | "break" | "const" | "continue" | "crate" | "dyn" | "else"
            | "enum" | "extern" | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop"
            | "match" | "mod" | "move" | "mut" | "pub" | "ref" | "return" | "self" | "static"
            | "struct" | "super" | "trait" | "true" | "type" | "unsafe" | "use" | "where"
            | "while"
    )
}
