//! rill-vm - the stack machine that runs a `rill-bc` program.
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! [`Vm`] owns a flat operand stack, a global-variable table, and a stack of
//! call frames for locals, and drives them by walking `rill-par`'s emitted
//! `Vec<Instruction>` one opcode at a time — there is no separate "compile to
//! native" step and no AST left to consult at runtime. Embedders hook into
//! execution through [`EventHook`] (§4.6): per-instruction ticks for budgets
//! and tracing, and an error callback for "log it and keep going" recovery.
//!
//! # Layout
//!
//! - [`vm`]: the `Vm` struct and its opcode dispatch loop.
//! - [`hooks`]: the [`EventHook`] trait and the stock [`NullHooks`] /
//!   [`InstructionBudget`] implementations.
//! - [`builtins`]: the bodies behind `rill-par`'s built-in function ids.
//! - [`error`]: [`VmError`], every fatal runtime failure mode.

mod builtins;
mod error;
mod hooks;
mod vm;

pub use error::{VmError, VmResult};
pub use hooks::{EventHook, HookDecision, InstructionBudget, NullHooks};
pub use vm::Vm;

#[cfg(test)]
mod tests {
    use super::*;
    use rill_value::Value;

    fn run(src: &str) -> Vm<'static> {
        let (tokens, lex_errors) = rill_lex::lex(src, "main");
        assert!(lex_errors.is_empty(), "unexpected lex errors: {lex_errors:?}");
        let (program, parse_errors) = rill_par::emit_program(&tokens);
        assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
        let program: &'static [rill_bc::Instruction] = Box::leak(program.into_boxed_slice());
        let mut vm = Vm::new(program);
        vm.run().expect("program should run to completion");
        vm
    }

    #[test]
    fn arithmetic_expression_lands_in_its_global_slot() {
        let vm = run("var x = 20 + (32 - 5) + 10 / 2;");
        assert_eq!(vm.globals()[0], Value::Integer(52));
    }

    #[test]
    fn while_loop_accumulates_across_iterations() {
        let vm = run("local var i = 0; var total = 0; while (i < 5) { total += i; i += 1; }");
        assert_eq!(vm.globals()[0], Value::Integer(10));
    }

    #[test]
    fn if_else_picks_the_taken_branch() {
        let vm = run("var flag = true; var result = 0; if (flag) { result = 1; } else { result = 2; }");
        assert_eq!(vm.globals()[1], Value::Integer(1));
    }

    #[test]
    fn dynamic_initializer_is_not_lost() {
        let vm = run("var add(a, b) { return a + b; } var sum = add(2, 3);");
        assert_eq!(vm.globals()[0], Value::Integer(5));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let (tokens, _) = rill_lex::lex("var x = 1; var y = x / 0;", "main");
        let (program, _) = rill_par::emit_program(&tokens);
        let mut vm = Vm::new(&program);
        let err = vm.run().unwrap_err();
        assert!(matches!(err, VmError::Value(rill_value::ValueError::DivideByZero)));
    }

    #[test]
    fn instruction_budget_halts_without_erroring() {
        let (tokens, _) = rill_lex::lex("local var i = 0; while (i < 1000000) { i += 1; }", "main");
        let (program, _) = rill_par::emit_program(&tokens);
        let mut vm = Vm::new(&program);
        let mut budget = InstructionBudget::new(10);
        vm.run_with_hooks(&mut budget).expect("budget halts cleanly, not an error");
    }
}
