use std::collections::{BTreeSet, HashMap};

use crate::bytecode::intrinsics;
use crate::bytecode::ir::Program;
use crate::bytecode::op::Pcode;

/// One step of a bounds-checked walk over a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Instr {
        ip: usize,
        op: Pcode,
        operand: Option<i32>,
    },
    /// The walk cannot continue past `ip`.
    Bad { ip: usize, reason: String },
}

/// Walk the program the way the VM fetches it, stopping after `EndCode` or
/// at the first word that cannot be decoded. Never reads past the end.
pub fn decode(program: &Program) -> Vec<Decoded> {
    let code = &program.code;
    let mut out = Vec::new();
    let mut ip = 1;

    loop {
        let Some(&word) = code.get(ip) else {
            out.push(Decoded::Bad {
                ip,
                reason: "no end".to_string(),
            });
            break;
        };
        let Some(op) = Pcode::from_word(word) else {
            out.push(Decoded::Bad {
                ip,
                reason: format!("pcode={}", word),
            });
            break;
        };

        let operand = if op.operand_count() == 1 {
            match code.get(ip + 1) {
                Some(&v) => Some(v),
                None => {
                    out.push(Decoded::Bad {
                        ip,
                        reason: format!("{} missing operand", op.mnemonic()),
                    });
                    break;
                }
            }
        } else {
            None
        };

        out.push(Decoded::Instr { ip, op, operand });
        if op == Pcode::EndCode {
            break;
        }
        ip += 1 + op.operand_count();
    }

    out
}

/// Plain listing: header lines, then one line per instruction.
pub fn disassemble(program: &Program) -> Vec<String> {
    if program.is_empty() {
        return vec!["Error: No code".to_string()];
    }

    let mut lines = vec![
        "-- Header --".to_string(),
        format!("Parameters={}", program.code[0]),
        "-- Code --".to_string(),
    ];
    lines.extend(decode(program).iter().map(|d| format_line(program, d)));
    lines
}

/// Listing for a terminal, with `►` in front of every jump target.
pub fn disassemble_pretty(program: &Program) -> Vec<String> {
    if program.is_empty() {
        return vec!["Error: No code".to_string()];
    }

    let decoded = decode(program);
    let targets = collect_jump_targets(&decoded);

    let mut lines = vec![format!("-- Parameters={} --", program.code[0])];
    for d in &decoded {
        let ip = match d {
            Decoded::Instr { ip, .. } | Decoded::Bad { ip, .. } => *ip,
        };
        let marker = if targets.contains(&ip) { "► " } else { "  " };
        lines.push(format!("{}{}", marker, format_line(program, d)));
    }
    lines
}

pub fn print_listing(program: &Program) {
    for line in disassemble_pretty(program) {
        println!("{}", line);
    }
}

fn collect_jump_targets(decoded: &[Decoded]) -> BTreeSet<usize> {
    decoded
        .iter()
        .filter_map(|d| match d {
            Decoded::Instr {
                ip,
                op,
                operand: Some(offset),
            } if op.is_jump() => Some(jump_target(*ip, *offset)),
            _ => None,
        })
        .filter_map(|t| usize::try_from(t).ok())
        .collect()
}

fn jump_target(ip: usize, offset: i32) -> i64 {
    ip as i64 + offset as i64 + 1
}

fn format_line(program: &Program, d: &Decoded) -> String {
    match d {
        Decoded::Instr { ip, op, operand } => {
            let text = operand_text(program, *ip, *op, *operand);
            format!("{:<7}{:<8}{}", format!("{}:", ip), op.mnemonic(), text)
                .trim_end()
                .to_string()
        }
        Decoded::Bad { ip, reason } => format!("{:<7}{:<8}{}", format!("{}:", ip), "err", reason),
    }
}

fn constant_text(program: &Program, index: i32) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|i| program.constants.get(i))
        .map_or_else(|| format!("const[{}]", index), |v| v.to_string())
}

fn operand_text(program: &Program, ip: usize, op: Pcode, operand: Option<i32>) -> String {
    let n = operand.unwrap_or_default();
    match op {
        Pcode::Push => "ax".to_string(),
        Pcode::PushVar => format!("varmem[{}]", n),
        Pcode::PushConst => constant_text(program, n),
        Pcode::LoadConst => format!("ax, {}", constant_text(program, n)),
        Pcode::LoadVar => format!("ax, varmem[{}]", n),
        Pcode::StoreVar => format!("varmem[{}], ax", n),

        Pcode::Neg => "-ax".to_string(),
        Pcode::LogicalNot => "!ax".to_string(),
        Pcode::BitNot => "~ax".to_string(),

        Pcode::JumpAlways | Pcode::JumpFalse | Pcode::JumpTrue => {
            jump_target(ip, n).to_string()
        }

        Pcode::EndCode | Pcode::None => String::new(),

        _ => match binary_symbol(op) {
            Some(sym) => format!("stack[sp] {} ax", sym),
            None => intrinsics::by_pcode(op)
                .map_or_else(|| format!("{:?}", op), |f| f.name.to_string()),
        },
    }
}

fn binary_symbol(op: Pcode) -> Option<&'static str> {
    Some(match op {
        Pcode::Add => "+",
        Pcode::Subtract => "-",
        Pcode::Multiply => "*",
        Pcode::Divide => "/",
        Pcode::Modulo => "%",
        Pcode::LogicalOr => "||",
        Pcode::LogicalAnd => "&&",
        Pcode::Equal => "==",
        Pcode::NotEqual => "!=",
        Pcode::LessThan => "<",
        Pcode::LessEqual => "<=",
        Pcode::GreaterThan => ">",
        Pcode::GreaterEqual => ">=",
        Pcode::BitAnd => "&",
        Pcode::BitOr => "|",
        Pcode::BitXor => "^",
        Pcode::BitShiftLeft => "<<",
        Pcode::BitShiftRight => ">>",
        _ => return None,
    })
}

// =============================================================================
// Statistics
// =============================================================================

/// Size summary and the most frequent opcodes.
pub fn bc_stats(program: &Program) -> Vec<String> {
    let decoded = decode(program);
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    let mut total = 0usize;

    for d in &decoded {
        if let Decoded::Instr { op, .. } = d {
            let name = match intrinsics::by_pcode(*op) {
                Some(f) => f.name,
                None => op.mnemonic(),
            };
            *counts.entry(name).or_default() += 1;
            total += 1;
        }
    }

    let mut lines = vec![
        format!("Words:         {}", program.code.len()),
        format!("Constants:     {}", program.constants.len()),
        format!("Instructions:  {}", total),
        "Op frequency:".to_string(),
    ];

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for (name, count) in sorted.into_iter().take(10) {
        let pct = (count as f64 / total.max(1) as f64) * 100.0;
        lines.push(format!("  {:<14} {:>4} ({:>5.1}%)", name, count, pct));
    }
    lines
}
