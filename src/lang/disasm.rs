use std::collections::BTreeSet;
use std::fmt::Write;

use super::instruction::Address;
use super::program::Program;
use crate::runtime::Trace;

const RULE: &str = "════════════════════════════════════════";

/// Disassembly of a program: one line per instruction, with jump targets
/// marked and each jump annotated with where it goes.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        " {} instructions, registers 0..={}",
        program.len(),
        program.highest_address()
    );
    let _ = writeln!(out, "{}", RULE);
    disassemble_into(&mut out, program);
    out
}

fn disassemble_into(out: &mut String, program: &Program) {
    let jump_targets = collect_jump_targets(program);

    for (ip, instruction) in program.iter().enumerate() {
        if jump_targets.contains(&ip) {
            let _ = writeln!(out, "      ┌──────────────────────────────────");
        }

        let marker = if jump_targets.contains(&ip) { "►" } else { " " };
        let text = instruction.to_string();

        match instruction.jump_target() {
            Some(target) => {
                let _ = writeln!(
                    out,
                    "{:04} {} {:<14} ; {}",
                    ip,
                    marker,
                    text,
                    describe_jump(ip, target, program.len())
                );
            }
            None => {
                let _ = writeln!(out, "{:04} {} {}", ip, marker, text);
            }
        }
    }
}

/// Addresses inside the program that some jump lands on.
fn collect_jump_targets(program: &Program) -> BTreeSet<Address> {
    program
        .iter()
        .filter_map(|instruction| instruction.jump_target())
        .filter(|&target| target < program.len())
        .collect()
}

fn describe_jump(ip: Address, target: Address, len: usize) -> String {
    if target >= len {
        "→ halt".to_string()
    } else if target == ip {
        "self-jump".to_string()
    } else if target < ip {
        format!("↑ {:04}", target)
    } else {
        format!("↓ {:04}", target)
    }
}

/// Tabular rendering of a trace, starting with the initial registers.
pub fn format_trace(trace: &Trace) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:>5}  {:<13} {:<14} registers", "step", "pc", "instruction");
    let _ = writeln!(
        out,
        "{:>5}  {:<13} {:<14} {:?}",
        "init",
        "",
        "",
        &**trace.initial_registers()
    );

    for (i, step) in trace.iter().enumerate() {
        let pc = format!("{:04} → {:04}", step.pc_before, step.pc_after);
        let _ = writeln!(
            out,
            "{:>5}  {:<13} {:<14} {:?}",
            i + 1,
            pc,
            step.instruction.to_string(),
            &*step.registers
        );
    }

    out
}
