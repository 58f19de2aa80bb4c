//! Grammar and emission coverage over realistic alpha formulas

use alpha_lang::{compile_module, parse, referenced_fields, to_rust, CompileOptions};

/// A sample of WorldQuant-101-style formulas exercising every grammar
/// production: ternaries, logic, powers, nested calls, dotted names,
/// unary minus, and bare numbers.
const CORPUS: &[&str] = &[
    "(rank(Ts_ArgMax(SignedPower(((returns < 0) ? stddev(returns, 20) : close), 2.), 5)) -0.5)",
    "(-1 * correlation(rank(delta(log(volume), 2)), rank(((close - open) / open)), 6))",
    "(-1 * correlation(open, volume, 10))",
    "(-1 * Ts_Rank(rank(low), 9))",
    "(rank((open - (sum(vwap, 10) / 10))) * (-1 * abs(rank((close - vwap)))))",
    "((-1 * rank(((sum(open, 5) * sum(returns, 5)) - delay((sum(open, 5) * sum(returns, 5)), 10)))))",
    "((adv20 < volume) ? ((-1 * ts_rank(abs(delta(close, 7)), 60)) * sign(delta(close, 7))) : (-1 * 1))",
    "(rank(covariance(rank(high), rank(volume), 5)) * -1)",
    "(sign(delta(volume, 1)) * (-1 * delta(close, 1)))",
    "SUM((CLOSE=DELAY(CLOSE,1)?0:CLOSE-(CLOSE>DELAY(CLOSE,1)?MIN(LOW,DELAY(CLOSE,1)):MAX(HIGH,DELAY(CLOSE,1)))),6)",
    "MEAN(CLOSE, 12) / CLOSE",
    "CLOSE && OPEN || LOW",
    "a.b + market.cap",
];

#[test]
fn corpus_parses() {
    let mut failures = Vec::new();
    for (i, formula) in CORPUS.iter().enumerate() {
        // Legacy GTJA spellings use `=` for equality; normalize before
        // parsing like the formula loader does.
        let normalized = normalize_equality(formula);
        if let Err(e) = parse(&normalized) {
            failures.push(format!("#{i}: {e}"));
        }
    }
    assert!(failures.is_empty(), "{failures:?}");
}

#[test]
fn corpus_compiles_to_rust() {
    for formula in CORPUS {
        let normalized = normalize_equality(formula);
        let code = to_rust("alpha_x", &normalized, &CompileOptions::default()).unwrap();
        assert!(code.contains("pub fn alpha_x(ctx: &ExecContext) -> Result<Series> {"));
        assert!(code.contains("Ok("));
    }
}

#[test]
fn dotted_names_are_fields() {
    let fields = referenced_fields("a.b + market.cap", None).unwrap();
    assert_eq!(fields, vec!["a.b".to_string(), "market.cap".to_string()]);

    let code = to_rust(
        "t",
        "a.b + 1",
        &CompileOptions {
            as_function: false,
            ..Default::default()
        },
    )
    .unwrap();
    assert!(code.contains("ctx.field(\"a.b\")?"));
}

#[test]
fn upper_transform_and_hoisting_compose() {
    let upper = |s: &str| s.to_uppercase();
    let code = to_rust(
        "alpha_ratio",
        "close / delay(close, 1) - 1",
        &CompileOptions {
            name_transform: Some(&upper),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(code.contains("let close = ctx.field(\"CLOSE\")?;"));
    assert!(code.contains("ctx.delay(&close, 1.0)?"));
    // one hoist, two uses
    assert_eq!(code.matches("ctx.field(\"CLOSE\")?").count(), 1);
}

#[test]
fn module_output_is_one_function_per_formula() {
    let sources: Vec<&str> = vec!["close / open"; 12];
    let code = compile_module(&sources, "alpha_", &CompileOptions::default()).unwrap();
    // zero-padded to the width of the count
    assert!(code.contains("pub fn alpha_01(ctx"));
    assert!(code.contains("pub fn alpha_12(ctx"));
    assert_eq!(code.matches("pub fn ").count(), 12);
}

#[test]
fn parse_errors_carry_positions() {
    for bad in ["MA(close", "a ? b", "1 +", "(a", "a <"] {
        let err = parse(bad).unwrap_err();
        assert!(err.is_parse(), "{bad} should fail to parse");
        assert!(err.position().is_some());
    }
}

/// GTJA-191 sources write equality as a single `=`.
fn normalize_equality(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();
        if c == '='
            && next != Some('=')
            && !matches!(prev, Some('=') | Some('<') | Some('>') | Some('!'))
        {
            out.push_str("==");
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}
