use arbor_core::{AgentCtx, Ctx, Field};
use arbor_expr::compile;

fn ctx() -> AgentCtx {
    AgentCtx::new()
}

fn set_i64(ctx: &mut AgentCtx, key: &str, v: i64) {
    ctx.set(key, Field::I64(v));
}

fn set_f64(ctx: &mut AgentCtx, key: &str, v: f64) {
    ctx.set(key, Field::F64(v));
}

fn set_bool(ctx: &mut AgentCtx, key: &str, v: bool) {
    ctx.set(key, Field::Bool(v));
}

#[test]
fn int_addition() {
    let p = compile::<AgentCtx>("int x, y; x + y").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 10);
    set_i64(&mut c, "y", 5);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(15));
}

#[test]
fn float_multiplication() {
    let p = compile::<AgentCtx>("float x, y; x * y").unwrap();
    let mut c = ctx();
    set_f64(&mut c, "x", 3.14);
    set_f64(&mut c, "y", 2.0);
    let v = p.eval(&mut c).unwrap().as_f64().unwrap();
    assert!((v - 6.28).abs() < 1e-3);
}

#[test]
fn logic_and() {
    let p = compile::<AgentCtx>("int x, y; x > 5 && y < 10").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 8);
    set_i64(&mut c, "y", 3);
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(true));
}

#[test]
fn ternary_abs() {
    let p = compile::<AgentCtx>("int x; x > 0 ? x : -x").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 5);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(5));
    set_i64(&mut c, "x", -3);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(3));
}

#[test]
fn assignment_writes_through_ctx() {
    let p = compile::<AgentCtx>("int x; x = 42").unwrap();
    let mut c = ctx();
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(42));
    assert_eq!(c.get("x").and_then(|f| f.as_i64()), Some(42));
}

#[test]
fn compound_arithmetic() {
    let p = compile::<AgentCtx>("int x, y, z, w; (x + y) * z - w").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 2);
    set_i64(&mut c, "y", 3);
    set_i64(&mut c, "z", 4);
    set_i64(&mut c, "w", 5);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(15));
}

#[test]
fn remainder() {
    let p = compile::<AgentCtx>("int x, y; x % y").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 17);
    set_i64(&mut c, "y", 5);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(2));
}

#[test]
fn integer_power() {
    let p = compile::<AgentCtx>("int x, y; x ^ y").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 2);
    set_i64(&mut c, "y", 3);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(8));

    set_i64(&mut c, "x", 0);
    set_i64(&mut c, "y", 0);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(1));

    set_i64(&mut c, "x", -2);
    set_i64(&mut c, "y", 3);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(-8));
}

#[test]
fn float_power() {
    let p = compile::<AgentCtx>("float x, y; x ^ y").unwrap();
    let mut c = ctx();
    set_f64(&mut c, "x", 2.0);
    set_f64(&mut c, "y", 3.0);
    let v = p.eval(&mut c).unwrap().as_f64().unwrap();
    assert!((v - 8.0).abs() < 1e-3);
}

#[test]
fn unary_operators() {
    let p = compile::<AgentCtx>("int x; -x").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 5);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(-5));

    let p = compile::<AgentCtx>("bool flag; !flag").unwrap();
    set_bool(&mut c, "flag", true);
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(false));
}

#[test]
fn literals() {
    let p = compile::<AgentCtx>("true").unwrap();
    assert_eq!(p.eval(&mut ctx()).unwrap().as_bool(), Some(true));

    let p = compile::<AgentCtx>("3.14159").unwrap();
    let v = p.eval(&mut ctx()).unwrap().as_f64().unwrap();
    assert!((v - 3.14159).abs() < 1e-5);
}

#[test]
fn host_function_call() {
    // A call's result type comes from the variable table.
    let p = compile::<AgentCtx>("int x, ff, _1; _1 = x; ff() + 2 * x + 1").unwrap();
    let mut c = ctx();
    c.register(
        "ff",
        Box::new(|bb, _| {
            let v = bb.get_i64("_1")?;
            Some(Field::I64(v * v))
        }),
    );
    set_i64(&mut c, "x", 2);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(9));
}

#[test]
fn call_arguments_are_evaluated() {
    let p = compile::<AgentCtx>("int square, x; square(x + 1)").unwrap();
    let mut c = ctx();
    c.register(
        "square",
        Box::new(|_, args| {
            let v = args[0].as_i64()?;
            Some(Field::I64(v * v))
        }),
    );
    set_i64(&mut c, "x", 3);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(16));
}

#[test]
fn operator_precedence() {
    let p = compile::<AgentCtx>("int x, y, z; x + y ^ z").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 2);
    set_i64(&mut c, "y", 3);
    set_i64(&mut c, "z", 2);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(11));

    let p = compile::<AgentCtx>("int a, b, c, d; a * b + c * d").unwrap();
    set_i64(&mut c, "a", 2);
    set_i64(&mut c, "b", 3);
    set_i64(&mut c, "c", 4);
    set_i64(&mut c, "d", 5);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(26));
}

#[test]
fn power_is_right_associative() {
    let p = compile::<AgentCtx>(
        "int base, exp1, exp2; float result; result = base ^ exp1 ^ exp2; result > 250",
    )
    .unwrap();
    let mut c = ctx();
    set_i64(&mut c, "base", 2);
    set_i64(&mut c, "exp1", 3);
    set_i64(&mut c, "exp2", 2);
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(true));
    let stored = c.get("result").and_then(|f| f.as_f64()).unwrap();
    assert!((stored - 512.0).abs() < 1e-3);
}

#[test]
fn nested_ternary() {
    let p =
        compile::<AgentCtx>("int x, y, z; x > 0 ? (y > 0 ? x + y : x - y) : (z > 0 ? z : 0)")
            .unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 5);
    set_i64(&mut c, "y", 3);
    set_i64(&mut c, "z", 2);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(8));

    set_i64(&mut c, "y", -3);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(8));

    set_i64(&mut c, "x", -5);
    set_i64(&mut c, "z", 7);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(7));
}

#[test]
fn multi_statement_program() {
    let p = compile::<AgentCtx>(
        "int x, y, z, result; float ratio; \
         x = 10; y = 5; z = x * y; ratio = z / 25.0; \
         result = ratio > 1.5 ? z + 10 : z - 10",
    )
    .unwrap();
    let mut c = ctx();
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(60));
    assert_eq!(c.get("z").and_then(|f| f.as_i64()), Some(50));
    let ratio = c.get("ratio").and_then(|f| f.as_f64()).unwrap();
    assert!((ratio - 2.0).abs() < 1e-3);
}

#[test]
fn int_division_becomes_float_under_float_target() {
    // Down-inference pushes the float target into the integer division.
    let p = compile::<AgentCtx>("int hp, max_hp; float hp_ratio; hp_ratio = hp / max_hp; hp_ratio")
        .unwrap();
    let mut c = ctx();
    set_i64(&mut c, "hp", 60);
    set_i64(&mut c, "max_hp", 100);
    let v = p.eval(&mut c).unwrap().as_f64().unwrap();
    assert!((v - 0.6).abs() < 1e-6);
}

#[test]
fn mixed_int_float_arithmetic() {
    let p = compile::<AgentCtx>("int count; float rate; count = 10; rate = 0.8; count * rate")
        .unwrap();
    let mut c = ctx();
    let v = p.eval(&mut c).unwrap().as_f64().unwrap();
    assert!((v - 8.0).abs() < 1e-3);
}

#[test]
fn short_circuit_and_or() {
    let p = compile::<AgentCtx>("bool flag1; int x; flag1 = false; x = 0; flag1 && x > 0").unwrap();
    let mut c = ctx();
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(false));
    assert_eq!(c.get("x").and_then(|f| f.as_i64()), Some(0));

    let p = compile::<AgentCtx>("bool flag1; int y; flag1 = true; y = 0; flag1 || y > 0").unwrap();
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(true));

    let p = compile::<AgentCtx>(
        "bool a, b; int count; a = false; b = true; count = 10; a && b && count > 5",
    )
    .unwrap();
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(false));
}

#[test]
fn try_ident_reads_zero_on_miss() {
    let p = compile::<AgentCtx>("int _tmp; _tmp + 1").unwrap();
    let mut c = ctx();
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(1));

    set_i64(&mut c, "_tmp", 41);
    assert_eq!(p.eval(&mut c).unwrap().as_i64(), Some(42));
}

#[test]
fn declaration_only_program_runs() {
    let p = compile::<AgentCtx>("int x, y").unwrap();
    let mut c = ctx();
    assert!(p.eval(&mut c).is_ok());
}

#[test]
fn compilation_is_deterministic() {
    let src = "int x, y; x * y + x - y";
    let p1 = compile::<AgentCtx>(src).unwrap();
    let p2 = compile::<AgentCtx>(src).unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 7);
    set_i64(&mut c, "y", 3);
    assert_eq!(
        p1.eval(&mut c).unwrap().as_i64(),
        p2.eval(&mut c).unwrap().as_i64()
    );
}

#[test]
fn shared_program_across_contexts() {
    let p = compile::<AgentCtx>("int x; x * 2").unwrap();
    let q = p.clone();
    let mut a = ctx();
    let mut b = ctx();
    set_i64(&mut a, "x", 2);
    set_i64(&mut b, "x", 5);
    assert_eq!(p.eval(&mut a).unwrap().as_i64(), Some(4));
    assert_eq!(q.eval(&mut b).unwrap().as_i64(), Some(10));
}

#[test]
#[should_panic]
fn integer_division_by_zero_panics() {
    let p = compile::<AgentCtx>("int x, y; x / y").unwrap();
    let mut c = ctx();
    set_i64(&mut c, "x", 10);
    set_i64(&mut c, "y", 0);
    let _ = p.eval(&mut c);
}

#[test]
fn decision_script() {
    let p = compile::<AgentCtx>(
        "int hp, mp, max_hp, max_mp, skill_cost, cooldown_time, current_time; \
         float hp_ratio, mp_ratio; \
         bool can_cast_skill; \
         hp_ratio = hp / max_hp; \
         mp_ratio = mp / max_mp; \
         can_cast_skill = (mp >= skill_cost) && (current_time >= cooldown_time) && (hp_ratio > 0.3); \
         can_cast_skill && (hp_ratio < 0.8 || mp_ratio > 0.9)",
    )
    .unwrap();
    let mut c = ctx();
    set_i64(&mut c, "hp", 60);
    set_i64(&mut c, "max_hp", 100);
    set_i64(&mut c, "mp", 80);
    set_i64(&mut c, "max_mp", 100);
    set_i64(&mut c, "skill_cost", 50);
    set_i64(&mut c, "cooldown_time", 10);
    set_i64(&mut c, "current_time", 15);
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(true));

    set_i64(&mut c, "mp", 30);
    assert_eq!(p.eval(&mut c).unwrap().as_bool(), Some(false));
}
