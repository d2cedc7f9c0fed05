use std::cell::RefCell;
use std::rc::Rc;

use caravel::{
    car, cdr, cons, list, Cell, Env, Error, Interp, Number, Port, PrimOp, Symbol,
};

fn call(scm: &Interp, op: PrimOp, args: &[Cell]) -> Cell {
    scm.call(&scm.getenv(), op, args)
        .unwrap_or_else(|e| panic!("call {op:?} failed: {e}"))
}

fn call_err(scm: &Interp, op: PrimOp, args: &[Cell]) -> Error {
    match scm.call(&scm.getenv(), op, args) {
        Err(e) => e,
        Ok(cell) => panic!("call {op:?} unexpectedly yielded {cell}"),
    }
}

// ============================================================================
// Pairs and lists
// ============================================================================

#[test]
fn cons_car_cdr() {
    let scm = Interp::new();
    let p = call(&scm, PrimOp::Cons, &[Cell::number(1), Cell::number(2)]);
    assert_eq!(p, cons(Cell::number(1), Cell::number(2)));
    assert_eq!(call(&scm, PrimOp::Car, &[p.clone()]), Cell::number(1));
    assert_eq!(call(&scm, PrimOp::Cdr, &[p]), Cell::number(2));
}

#[test]
fn car_of_non_pair_is_a_type_mismatch() {
    let scm = Interp::new();
    assert!(matches!(
        call_err(&scm, PrimOp::Car, &[Cell::number(1)]),
        Error::TypeMismatch { expected: "pair", .. }
    ));
    assert!(matches!(
        call_err(&scm, PrimOp::Cdr, &[Cell::Nil]),
        Error::TypeMismatch { expected: "pair", .. }
    ));
}

#[test]
fn set_car_and_set_cdr_mutate_in_place() {
    let scm = Interp::new();
    let p = cons(Cell::number(1), Cell::number(2));

    let r = call(&scm, PrimOp::SetCar, &[p.clone(), Cell::symbol("v")]);
    assert!(r.is_none());
    let got = call(&scm, PrimOp::Car, &[p.clone()]);
    assert_eq!(got, Cell::symbol("v"));
    assert!(got.is_eq(&Cell::symbol("v")));

    let r = call(&scm, PrimOp::SetCdr, &[p.clone(), Cell::Nil]);
    assert!(r.is_none());
    assert_eq!(format!("{p}"), "(v)");
}

#[test]
fn list_builds_a_proper_list() {
    let scm = Interp::new();
    let xs = call(
        &scm,
        PrimOp::List,
        &[Cell::number(1), Cell::number(2), Cell::number(3)],
    );
    assert_eq!(
        xs,
        list(vec![Cell::number(1), Cell::number(2), Cell::number(3)])
    );
    assert_eq!(car(&xs).unwrap(), Cell::number(1));
    assert_eq!(
        cdr(&xs).unwrap(),
        list(vec![Cell::number(2), Cell::number(3)])
    );
    assert_eq!(call(&scm, PrimOp::List, &[]), Cell::Nil);
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn additive_and_multiplicative_identities() {
    let scm = Interp::new();
    assert_eq!(call(&scm, PrimOp::Add, &[]), Cell::number(0));
    assert_eq!(call(&scm, PrimOp::Mul, &[]), Cell::number(1));

    for n in [
        Cell::number(7),
        Cell::number(-3.25),
        Cell::Number(Number::complex(2.0, -1.0)),
    ] {
        assert_eq!(call(&scm, PrimOp::Add, &[n.clone(), Cell::number(0)]), n);
        assert_eq!(call(&scm, PrimOp::Mul, &[n.clone(), Cell::number(1)]), n);
        assert_eq!(
            call(&scm, PrimOp::Sub, &[n.clone(), n.clone()]),
            Cell::number(0)
        );
        assert_eq!(
            call(&scm, PrimOp::Div, &[n.clone(), n.clone()]),
            Cell::number(1)
        );
    }
}

#[test]
fn folds_run_left_to_right() {
    let scm = Interp::new();
    assert_eq!(
        call(
            &scm,
            PrimOp::Add,
            &[Cell::number(1), Cell::number(2), Cell::number(3)]
        ),
        Cell::number(6)
    );
    assert_eq!(
        call(
            &scm,
            PrimOp::Sub,
            &[Cell::number(10), Cell::number(3), Cell::number(2)]
        ),
        Cell::number(5)
    );
    assert_eq!(
        call(&scm, PrimOp::Div, &[Cell::number(12), Cell::number(3), Cell::number(2)]),
        Cell::number(2)
    );
}

#[test]
fn single_argument_forms() {
    let scm = Interp::new();
    assert_eq!(call(&scm, PrimOp::Sub, &[Cell::number(5)]), Cell::number(-5));
    assert_eq!(
        call(&scm, PrimOp::Div, &[Cell::number(2.0)]),
        Cell::number(0.5)
    );
}

#[test]
fn complex_promotion_through_the_dispatcher() {
    let scm = Interp::new();
    let i = Cell::Number(Number::complex(0.0, 1.0));
    let sum = call(&scm, PrimOp::Add, &[Cell::number(1), i]);
    assert!(sum.as_number().unwrap().is_complex());

    // (1+2i) * (1+2i) = -3+4i
    let z = Cell::Number(Number::complex(1.0, 2.0));
    let sq = call(&scm, PrimOp::Mul, &[z.clone(), z]);
    assert_eq!(sq, Cell::Number(Number::complex(-3.0, 4.0)));
}

#[test]
fn division_by_exact_zero_raises() {
    let scm = Interp::new();
    assert!(matches!(
        call_err(&scm, PrimOp::Div, &[Cell::number(1), Cell::number(0)]),
        Error::Arithmetic(_)
    ));
}

#[test]
fn arithmetic_wants_numbers() {
    let scm = Interp::new();
    assert!(matches!(
        call_err(&scm, PrimOp::Add, &[Cell::number(1), Cell::string("x")]),
        Error::TypeMismatch { expected: "number", .. }
    ));
}

// ============================================================================
// Arity and opcode errors
// ============================================================================

#[test]
fn missing_arguments_are_arity_errors() {
    let scm = Interp::new();
    assert!(matches!(call_err(&scm, PrimOp::Car, &[]), Error::Arity("car")));
    assert!(matches!(call_err(&scm, PrimOp::Sub, &[]), Error::Arity("-")));
    assert!(matches!(
        call_err(&scm, PrimOp::Cons, &[Cell::number(1)]),
        Error::Arity("cons")
    ));
    assert!(matches!(call_err(&scm, PrimOp::Write, &[]), Error::Arity("write")));
}

#[test]
fn syntax_opcodes_are_not_callable() {
    let scm = Interp::new();
    assert!(matches!(call_err(&scm, PrimOp::Quote, &[]), Error::InvalidOp));
    assert!(matches!(
        call_err(&scm, PrimOp::Define, &[Cell::number(1)]),
        Error::InvalidOp
    ));
}

// ============================================================================
// Output opcodes
// ============================================================================

fn string_port() -> Cell {
    Cell::Port(Rc::new(RefCell::new(Port::string_output())))
}

fn port_text(cell: &Cell) -> String {
    match cell {
        Cell::Port(p) => p.borrow().output_string().unwrap(),
        other => panic!("expected port, got {other}"),
    }
}

#[test]
fn write_is_reader_reversible() {
    let scm = Interp::new();
    let out = string_port();
    let xs = list(vec![Cell::symbol("+"), Cell::number(1), Cell::number(2)]);
    let r = call(&scm, PrimOp::Write, &[xs, out.clone()]);
    assert!(r.is_none());
    assert_eq!(port_text(&out), "(+ 1 2)");
    assert_eq!(scm.read_str(&port_text(&out)).unwrap(), scm.read_str("(+ 1 2)").unwrap());
}

#[test]
fn write_and_display_differ_on_strings_and_chars() {
    let scm = Interp::new();

    let out = string_port();
    call(&scm, PrimOp::Write, &[Cell::Char('\n'), out.clone()]);
    assert_eq!(port_text(&out), "#\\newline");

    let out = string_port();
    call(&scm, PrimOp::Display, &[Cell::Char('\n'), out.clone()]);
    assert_eq!(port_text(&out), "\n");

    let out = string_port();
    call(&scm, PrimOp::Write, &[Cell::string("a\\tb"), out.clone()]);
    assert_eq!(port_text(&out), "\"a\\tb\"");

    let out = string_port();
    call(&scm, PrimOp::Display, &[Cell::string("a\\tb"), out.clone()]);
    assert_eq!(port_text(&out), "a\tb");
}

#[test]
fn newline_writes_a_line_break() {
    let scm = Interp::new();
    let out = string_port();
    let r = call(&scm, PrimOp::Newline, &[out.clone()]);
    assert!(r.is_none());
    assert_eq!(port_text(&out), "\n");
}

#[test]
fn writing_to_a_non_port_is_a_type_mismatch() {
    let scm = Interp::new();
    assert!(matches!(
        call_err(&scm, PrimOp::Write, &[Cell::number(1), Cell::number(2)]),
        Error::TypeMismatch { expected: "port", .. }
    ));
}

#[test]
fn writing_to_an_input_port_is_rejected() {
    let scm = Interp::new();
    let port = Cell::Port(Rc::new(RefCell::new(Port::string_input("x"))));
    assert!(matches!(
        call_err(&scm, PrimOp::Write, &[Cell::number(1), port]),
        Error::OutputPort(_)
    ));
}

#[test]
fn cycle_safe_write_through_the_dispatcher() {
    let scm = Interp::new();
    let p = cons(Cell::symbol("x"), Cell::Nil);
    call(&scm, PrimOp::SetCdr, &[p.clone(), p.clone()]);

    let out = string_port();
    call(&scm, PrimOp::Write, &[p, out.clone()]);
    assert_eq!(port_text(&out), "(x x ...)");
}

// ============================================================================
// Environment integration
// ============================================================================

#[test]
fn primops_are_bound_in_the_top_environment() {
    let scm = Interp::new();
    let env = scm.getenv();
    assert_eq!(env.get(Symbol::new("+")).unwrap(), Cell::Op(PrimOp::Add));
    assert_eq!(env.get(Symbol::new("cons")).unwrap(), Cell::Op(PrimOp::Cons));
    assert_eq!(env.get(Symbol::new("quote")).unwrap(), Cell::Op(PrimOp::Quote));
    assert!(matches!(
        env.get(Symbol::new("no-such-binding")),
        Err(Error::UnknownSymbol(_))
    ));
}

#[test]
fn opcode_printing_uses_scheme_names() {
    assert_eq!(format!("{}", Cell::Op(PrimOp::Quote)), "quote");
    assert_eq!(format!("{}", Cell::Op(PrimOp::Set)), "set!");
    assert_eq!(format!("{}", Cell::Op(PrimOp::Arrow)), "=>");
    assert_eq!(format!("{}", Cell::Op(PrimOp::DefineMacro)), "define-macro");
    assert_eq!(format!("{}", Cell::Op(PrimOp::UnquoteSplice)), "unquote-splicing");
    // anything outside the syntax list prints opaquely
    assert_eq!(format!("{}", Cell::Op(PrimOp::Add)), "#<primop>");
    assert_eq!(format!("{}", Cell::Op(PrimOp::Write)), "#<primop>");
}

#[test]
fn read_then_resolve_then_call() {
    // the full data path: text -> cells -> env resolution -> dispatcher
    let scm = Interp::new();
    let expr = scm.read_str("(+ 1 2 3)").unwrap();

    let env: Env = scm.getenv();
    let op = match env.get(car(&expr).unwrap().as_symbol().unwrap()).unwrap() {
        Cell::Op(op) => op,
        other => panic!("expected opcode, got {other}"),
    };

    let mut args = Vec::new();
    let mut rest = cdr(&expr).unwrap();
    while rest.is_pair() {
        args.push(car(&rest).unwrap());
        rest = cdr(&rest).unwrap();
    }

    assert_eq!(call(&scm, op, &args), Cell::number(6));
}
