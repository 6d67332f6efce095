//! Bytecode emission: turns the framed token stream `rill-lex` produces into
//! a flat `Vec<rill_bc::Instruction>` a `rill-vm` can run directly.
//!
//! There is no AST here. The lexer already resolved scopes, folded static
//! initializers, and wrapped every control structure in a matched pair of
//! framing markers (§4.2.6); [`emit`] walks that stream once, maintaining a
//! shunting-yard over expressions and a symbol table ([`symtab`]) over
//! declarations, and emits instructions directly in the order the VM's
//! stack machine needs them.

mod emit;
mod error;
mod symtab;

pub use emit::emit_program;
pub use error::{ParseError, ParseErrorKind};
pub use symtab::{lookup_builtin, Builtin, SymbolTable, BUILTINS};

#[cfg(test)]
mod tests {
    use super::*;
    use rill_bc::Opcode;

    fn compile(src: &str) -> (Vec<rill_bc::Instruction>, Vec<ParseError>) {
        let (tokens, lex_errors) = rill_lex::lex(src, "main");
        assert!(lex_errors.is_empty(), "unexpected lex errors: {lex_errors:?}");
        emit_program(&tokens)
    }

    #[test]
    fn emits_an_arithmetic_expression_left_to_right_with_precedence() {
        let (program, errors) = compile("var x = 20 + (32 - 5) + 10 / 2;");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        // `x` folds to a literal at lex time, so the emitted program is just
        // a single DEF carrying the already-computed value plus END.
        assert_eq!(program[0].opcode, Opcode::Def);
        assert_eq!(program[0].value, Some(rill_value::Value::Integer(47)));
        assert_eq!(program.last().unwrap().opcode, Opcode::End);
    }

    #[test]
    fn emits_an_if_else_with_both_branches_reachable() {
        let (program, errors) = compile("if (1 == 2) { var a = 1; } else { var b = 2; }");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let opcodes: Vec<Opcode> = program.iter().map(|i| i.opcode).collect();
        assert!(opcodes.contains(&Opcode::Teq));
        assert!(opcodes.contains(&Opcode::Jif));
        assert!(opcodes.contains(&Opcode::Jmp));
    }

    #[test]
    fn emits_a_while_loop_that_jumps_back_to_its_condition() {
        let (program, errors) = compile("local var i = 0; while (i < 10) { i += 1; }");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let back_jump = program
            .iter()
            .enumerate()
            .find(|(idx, i)| i.opcode == Opcode::Jmp && i.location < *idx)
            .expect("expected a backward jump closing the loop body");
        assert!(back_jump.1.location < program.len());
    }

    #[test]
    fn calling_an_undefined_function_is_a_parse_error() {
        let (_, errors) = compile("doesNotExist(1, 2);");
        assert!(errors.iter().any(|e| matches!(e.kind, ParseErrorKind::UndefinedFunction(_))));
    }

    #[test]
    fn builtin_call_with_too_few_arguments_is_a_parse_error() {
        let (_, errors) = compile("print();");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::TooFewArguments { .. })));
    }

    #[test]
    fn break_outside_a_loop_is_a_parse_error() {
        let (_, errors) = compile("brk;");
        assert!(errors.iter().any(|e| matches!(e.kind, ParseErrorKind::BreakOutsideLoop)));
    }

    #[test]
    fn a_function_definition_emits_a_skip_jump_over_its_body() {
        let (program, errors) = compile("var add(a, b) { return a + b; } add(1, 2);");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        assert_eq!(program[0].opcode, Opcode::Jmp);
        let call = program.iter().find(|i| i.opcode == Opcode::Jsr).unwrap();
        assert_ne!(call.location, 0);
    }

    #[test]
    fn builtin_call_emits_jbf_with_its_dispatch_id_instead_of_jsr() {
        let (program, errors) = compile("print(1);");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let call = program.iter().find(|i| i.opcode == Opcode::Jbf).expect("expected a JBF");
        assert_eq!(call.value, Some(rill_value::Value::Integer(0)));
        assert_eq!(call.operand, 1);
        assert!(!program.iter().any(|i| i.opcode == Opcode::Jsr));
    }

    #[test]
    fn collection_field_assignment_and_read_use_element_addresses() {
        let (program, errors) = compile("var c = { a: 1 }; c.a = 2; var x = c.a;");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");

        assert!(program
            .iter()
            .any(|i| i.opcode == Opcode::Def && matches!(i.value, Some(rill_value::Value::Collection(_)))));

        assert!(program
            .iter()
            .any(|i| i.opcode == Opcode::Sav && i.address.as_ref().map(is_element_address) == Some(true)));

        let read = program
            .iter()
            .find(|i| i.opcode == Opcode::Pcv)
            .expect("expected a PCV reading through an element address");
        assert!(is_element_address(read.address.as_ref().unwrap()));
    }

    fn is_element_address(addr: &rill_bc::Address) -> bool {
        matches!(addr, rill_bc::Address::Element { .. })
    }

    #[test]
    fn on_error_and_on_tick_definitions_register_as_event_handlers() {
        let (program, errors) = compile("var onError() { return 0; } var onTick() { return 0; }");
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");

        let efis: Vec<_> = program.iter().filter(|i| i.opcode == Opcode::Efi).collect();
        assert_eq!(efis.len(), 2);
        assert!(efis.iter().any(|i| i.value.is_none()));
        assert!(efis
            .iter()
            .any(|i| i.value == Some(rill_value::Value::Integer(1))));
    }
}
