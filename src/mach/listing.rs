use super::{Address, ByteCode, Executable, Instruction, Opcode, Program};

/// ## Listings
///
/// Source listings of stored programs and disassembly of fragments and
/// linked executables.

#[derive(Debug)]
pub struct Listing;

impl Listing {
    /// `(offset, opcode, operands)` for each instruction.
    pub fn disassemble(code: &[Instruction]) -> Vec<(Address, Opcode, String)> {
        code.iter()
            .enumerate()
            .map(|(addr, i)| (addr, i.opcode, Listing::operands(i)))
            .collect()
    }

    fn operands(instruction: &Instruction) -> String {
        let text = instruction.to_string();
        text[instruction.opcode.name().len()..].trim_start().to_string()
    }

    fn format(addr: Address, opcode: Opcode, operands: &str) -> String {
        if operands.is_empty() {
            format!("  {:04} {}", addr, opcode)
        } else {
            format!("  {:04} {:<12} {}", addr, opcode.name(), operands)
        }
    }

    /// Program text with loop bodies indented.
    pub fn source(program: &Program) -> Vec<String> {
        program
            .statements()
            .map(|s| {
                let mut line = format!("{} {}", s.number(), "  ".repeat(s.indent()));
                if let Some(label) = s.label() {
                    line.push_str(label);
                    line.push_str(": ");
                }
                line.push_str(s.line().text());
                line.trim_end().to_string()
            })
            .collect()
    }

    pub fn fragment(code: &ByteCode) -> Vec<String> {
        Listing::disassemble(code.instructions())
            .iter()
            .map(|(addr, opcode, operands)| Listing::format(*addr, *opcode, operands))
            .collect()
    }

    /// Disassembly interleaved with the statement each run of code came
    /// from.
    pub fn executable(program: &Executable) -> Vec<String> {
        let mut out = vec![];
        let mut lines = program.lines().iter().peekable();
        for (addr, opcode, operands) in Listing::disassemble(program.code()) {
            while let Some((start, number)) = lines.peek() {
                if *start > addr {
                    break;
                }
                match program.text_for(*number) {
                    Some(text) => out.push(format!("; {}", text)),
                    None => out.push(format!("; {}", number)),
                }
                lines.next();
            }
            out.push(Listing::format(addr, opcode, &operands));
        }
        out
    }
}
