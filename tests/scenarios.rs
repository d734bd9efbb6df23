use codeblock::bytecode::disasm::disassemble;
use codeblock::bytecode::stack_check::check_program;
use codeblock::{CompileOptions, Codeblock, ErrorKind};

fn eval(text: &str, args: &[f64]) -> f64 {
    let mut cb = Codeblock::new();
    if let Err(e) = cb.compile(text) {
        panic!("compile of {} failed: {}", text, e);
    }
    let value = cb.eval(args);
    assert_eq!(
        cb.last_error(),
        ErrorKind::None,
        "{} failed: {}",
        text,
        cb.error_detail()
    );
    value
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn compile_error(text: &str) -> ErrorKind {
    let mut cb = Codeblock::new();
    match cb.compile(text) {
        Ok(()) => panic!("expected {} to fail", text),
        Err(e) => e.kind,
    }
}

const COMMISSION: &str =
    "{|sales,r1,r2| r1*sales + iif( sales > 100000, (sales-100000)*r2, 0 ) }";

const KITCHEN_SINK: &str = "{|a,b,c,d,e,f|-abs(iif(a+c*f <= e/d*a, \
     iif(min(a,d) >= max(c,e), b*b, c*c), \
     iif(5 == c || 5 == e || 77 > 22 && !(10 < 3), Sqrt(c), Sqrt(d))))}";

const COMMISSION_ASSIGN: &str = "{|sales,r1,r2,r3,s100,s200| \
     (iif( sales > 200000, (s200=sales-200000, s100=100000), \
     s100=iif( sales > 100000, sales-100000, 0 )), \
     sales*r1 + s100*r2 + s200*r3) }";

const RGB: &str = "{|r,g,b|((r & 0x0ff) << 16) | ((g & 0x0ff) << 8) | (b & 0x0ff)}";

/// Programs with arguments that evaluate without error.
fn corpus() -> Vec<(&'static str, Vec<f64>)> {
    vec![
        ("{||5+3}", vec![]),
        ("{||5+6-3}", vec![]),
        ("{|length,width|length*width}", vec![3.0, 17.0]),
        (COMMISSION, vec![152000.0, 0.08, 0.05]),
        (COMMISSION, vec![320000.0, 0.08, 0.05]),
        ("{|r|2*r*CPi}", vec![7.0]),
        ("{|r|CPi*(r*r)}", vec![9.0]),
        ("{|a,b| iif(a > b, b, a)}", vec![7.0, 12.0]),
        ("{|a,b| sqrt(a*a+b*b)}", vec![7.0, 9.0]),
        ("{|| ce }", vec![]),
        (KITCHEN_SINK, vec![34.0, 43.0, 17.0, 25.0, 45.0, 13.0]),
        ("{|| iif( 7 > 6, (1,2,3,4,5), (10,11,12)) }", vec![]),
        (RGB, vec![178.0, 255.0, 102.0]),
        ("{|| ~0x6B2}", vec![]),
        (COMMISSION_ASSIGN, vec![320000.0, 0.08, 0.05, 0.03, 0.0, 0.0]),
        ("{|A1| 100 > A1 && A1 > 80 }", vec![90.0]),
        ("{|t|ATanD(t)}", vec![1.0]),
        ("{|a,b,c|(a=b=c,a)}", vec![5.0, 10.0, 33.0]),
        ("{|a,b|iif(a,b,1)+2}", vec![1.0, 5.0]),
        ("{|a,b|iif(a,b,1)+2}", vec![0.0, 5.0]),
        ("{|a,b|max(a, b) - min(a, b) % 3 ^ 1}", vec![4.0, 11.0]),
        ("{|x|numberformat(x, 2, 1) + round(x) * power(2, 3)}", vec![2.46]),
        ("{|a,b|a || b && !a}", vec![0.0, 1.0]),
        ("{|a|(a > 0 || (a = 99), a)}", vec![0.0]),
    ]
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_constant_expression() {
    assert_eq!(eval("{||5+3}", &[]), 8.0);
    assert_eq!(eval("{||5+6-3}", &[]), 8.0);
}

#[test]
fn test_area() {
    assert_eq!(eval("{|length,width|length*width}", &[3.0, 17.0]), 51.0);
}

#[test]
fn test_commission() {
    assert_close(eval(COMMISSION, &[152000.0, 0.08, 0.05]), 14760.0);
    assert_close(eval(COMMISSION, &[186100.0, 0.08, 0.07]), 20915.0);
    assert_close(eval(COMMISSION, &[320000.0, 0.08, 0.05]), 36600.0);
}

#[test]
fn test_divide_by_zero() {
    let mut cb = Codeblock::new();
    cb.compile("{||5+6/0}").unwrap();
    assert_eq!(cb.eval(&[]), 0.0);
    assert_eq!(cb.last_error(), ErrorKind::DivideByZero);
}

#[test]
fn test_unbalanced_parens() {
    assert_eq!(compile_error("{||35*3+6)}"), ErrorKind::UnbalancedParens);
}

#[test]
fn test_avg_needs_two_args() {
    assert_eq!(compile_error("{|a,b|avg(a)}"), ErrorKind::InsufficientArgs);
}

#[test]
fn test_circle() {
    assert_close(eval("{|r|2*r*CPi}", &[7.0]), 14.0 * std::f64::consts::PI);
    assert_close(eval("{|r|CPi*(r*r)}", &[9.0]), 81.0 * std::f64::consts::PI);
}

#[test]
fn test_iif_and_sqrt() {
    assert_eq!(eval("{|a,b| iif(a > b, b, a)}", &[7.0, 12.0]), 7.0);
    assert_close(eval("{|a,b| sqrt(a*a+b*b)}", &[7.0, 9.0]), 130f64.sqrt());
    assert_eq!(eval("{|| ce }", &[]), std::f64::consts::E);
}

#[test]
fn test_kitchen_sink() {
    let v = eval(KITCHEN_SINK, &[34.0, 43.0, 17.0, 25.0, 45.0, 13.0]);
    assert_close(v, -(17f64.sqrt()));
    assert_eq!((v * 100.0).round() / 100.0, -4.12);
}

#[test]
fn test_sequence_value_is_last() {
    assert_eq!(eval("{|| iif( 7 > 6, (1,2,3,4,5), (10,11,12)) }", &[]), 5.0);
    assert_eq!(eval("{|| iif( 7 < 6, (1,2,3,4,5), (10,11,12)) }", &[]), 12.0);
}

#[test]
fn test_bitwise() {
    assert_eq!(eval(RGB, &[178.0, 255.0, 102.0]), 11730790.0);
    assert_eq!(eval("{|| ~0x6B2}", &[]), -1715.0);
    assert_eq!(eval("{|a,b| a ^ b}", &[6.0, 3.0]), 5.0);
}

#[test]
fn test_commission_with_assignments() {
    let args = [320000.0, 0.08, 0.05, 0.03, 0.0, 0.0];
    assert_close(eval(COMMISSION_ASSIGN, &args), 34200.0);
    let args = [150000.0, 0.08, 0.05, 0.03, 0.0, 0.0];
    assert_close(eval(COMMISSION_ASSIGN, &args), 14500.0);
}

#[test]
fn test_logical_and_relational() {
    assert_eq!(eval("{|A1| 100 > A1 && A1 > 80 }", &[90.0]), 1.0);
    assert_eq!(eval("{|A1| 100 > A1 && A1 > 80 }", &[70.0]), 0.0);
    assert_eq!(eval("{|a| a <> 3}", &[3.0]), 0.0);
}

#[test]
fn test_degrees() {
    assert_close(eval("{|t|ATanD(t)}", &[1.0]), 45.0);
}

#[test]
fn test_chained_assignment() {
    assert_eq!(eval("{|a,b,c|(a=b=c,a)}", &[5.0, 10.0, 33.0]), 33.0);
}

#[test]
fn test_short_circuit_skips_right_operand() {
    // a > 0 decides the result; the assignment never runs
    assert_eq!(eval("{|a| a>0 || (a=99)}", &[1.0]), 1.0);
    assert_eq!(eval("{|a|(a > 0 || (a = 99), a)}", &[1.0]), 1.0);
    assert_eq!(eval("{|a|(a > 0 || (a = 99), a)}", &[0.0]), 99.0);
    assert_eq!(eval("{|a|(a > 0 && (a = 99), a)}", &[0.0]), 0.0);
}

#[test]
fn test_truthiness_is_positive() {
    assert_eq!(eval("{|a| iif(a, 1, 2)}", &[-1.0]), 2.0);
    assert_eq!(eval("{|a| !a}", &[-1.0]), 1.0);
    assert_eq!(eval("{|a,b| a || b}", &[-1.0, -1.0]), 0.0);
}

#[test]
fn test_missing_args_at_runtime() {
    let mut cb = Codeblock::new();
    cb.compile("{|a,b|a+b}").unwrap();
    assert_eq!(cb.eval(&[1.0]), 0.0);
    assert_eq!(cb.last_error(), ErrorKind::InsufficientArgs);
    assert_eq!(cb.error_detail(), "Expecting 2 arguments.");
}

#[test]
fn test_conditional_assignment_switch() {
    let text = "{|a| iif(a = a - 1, a, 100)}";
    assert_eq!(compile_error(text), ErrorKind::ConditionalAssignment);

    let mut cb = Codeblock::with_options(CompileOptions::default().allow_conditional_assignment(true));
    cb.compile(text).unwrap();
    assert_eq!(cb.eval(&[3.0]), 2.0);
    assert_eq!(cb.eval(&[1.0]), 100.0);
}

#[test]
fn test_case_insensitive() {
    assert_eq!(eval("{|X|ABS(X) + Max(x, 1)}", &[-4.0]), 5.0);
}

// =============================================================================
// Properties over the corpus
// =============================================================================

#[test]
fn test_optimizer_is_transparent() {
    for (text, args) in corpus() {
        let mut on = Codeblock::new();
        on.compile(text).unwrap();
        let mut off = Codeblock::with_options(CompileOptions::default().optimize(false));
        off.compile(text).unwrap();

        let a = on.eval(&args);
        let b = off.eval(&args);
        assert_eq!(a.to_bits(), b.to_bits(), "{}: {} vs {}", text, a, b);
        assert_eq!(on.last_error(), off.last_error(), "{}", text);
    }
}

#[test]
fn test_stack_is_balanced() {
    for opts in [CompileOptions::default(), CompileOptions::default().optimize(false)] {
        for (text, args) in corpus() {
            let mut cb = Codeblock::with_options(opts);
            cb.compile(text).unwrap();
            let exec = cb.try_eval(&args).unwrap();
            assert!(exec.leak.is_none(), "{} leaked", text);
            assert!(check_program(cb.program().unwrap()).is_ok(), "{}", text);
        }
    }
}

#[test]
fn test_disassembly_terminates_with_end() {
    for (text, _) in corpus() {
        let mut cb = Codeblock::new();
        cb.compile(text).unwrap();
        let lines = cb.disassemble();
        let last = lines.last().unwrap();
        assert!(last.ends_with("end"), "{}: {}", text, last);
    }
}

#[test]
fn test_disassembly_of_corrupt_code_is_bounded() {
    let mut cb = Codeblock::new();
    cb.compile(KITCHEN_SINK).unwrap();
    let program = cb.program().unwrap().clone();

    for cut in 1..program.code.len() {
        let mut truncated = program.clone();
        truncated.code.truncate(cut);
        let lines = disassemble(&truncated);
        assert!(!lines.is_empty());
    }
}

#[test]
fn test_compile_is_deterministic() {
    for (text, _) in corpus() {
        let mut a = Codeblock::new();
        let mut b = Codeblock::new();
        a.compile(text).unwrap();
        b.compile(text).unwrap();
        assert_eq!(a.program(), b.program(), "{}", text);
    }
}

#[test]
fn test_shared_program_across_threads() {
    let mut cb = Codeblock::new();
    cb.compile(COMMISSION).unwrap();
    let cb = &cb;

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                s.spawn(move || {
                    let sales = 150000.0 + 10000.0 * i as f64;
                    cb.try_eval(&[sales, 0.08, 0.05]).unwrap().value
                })
            })
            .collect();

        for (i, h) in handles.into_iter().enumerate() {
            let sales = 150000.0 + 10000.0 * i as f64;
            let expected = 0.08 * sales + (sales - 100000.0) * 0.05;
            assert_close(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_concurrent_compiles() {
    std::thread::scope(|s| {
        let handles: Vec<_> = corpus()
            .into_iter()
            .map(|(text, args)| s.spawn(move || (text, eval(text, &args), args)))
            .collect();
        for h in handles {
            let (text, value, args) = h.join().unwrap();
            assert_eq!(value.to_bits(), eval(text, &args).to_bits(), "{}", text);
        }
    });
}
