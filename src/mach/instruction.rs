use super::{Address, Opcode, Value, ValueType};

/// ## A single bytecode operation
///
/// An opcode plus whichever operands it needs. Non-branch instructions
/// are always resolved. A branch is resolved once `int_operand` holds a
/// code offset; in an unlinked fragment that offset is relative to the
/// start of the fragment.

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub int_operand: Option<i64>,
    pub str_operand: Option<String>,
    pub float_operand: Option<f64>,
    pub resolved: bool,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Instruction {
        Instruction {
            opcode,
            int_operand: None,
            str_operand: None,
            float_operand: None,
            resolved: !opcode.is_branch(),
        }
    }

    pub fn with_int(mut self, n: i64) -> Instruction {
        self.int_operand = Some(n);
        self
    }

    pub fn with_str<S: Into<String>>(mut self, s: S) -> Instruction {
        self.str_operand = Some(s.into());
        self
    }

    pub fn with_float(mut self, n: f64) -> Instruction {
        self.float_operand = Some(n);
        self
    }

    /// A branch already pointing at `target`.
    pub fn branch(opcode: Opcode, target: Address) -> Instruction {
        let mut i = Instruction::new(opcode).with_int(target as i64);
        i.resolved = true;
        i
    }

    /// A branch to a label or line number, resolved by the linker.
    pub fn branch_to_label<S: Into<String>>(opcode: Opcode, label: S) -> Instruction {
        Instruction::new(opcode).with_str(label)
    }

    /// The instruction that pushes `value`, if the value has a literal form.
    pub fn literal(value: &Value) -> Option<Instruction> {
        match value {
            Value::Integer(n) => Some(Instruction::new(Opcode::Integer).with_int(*n)),
            Value::Double(n) => Some(Instruction::new(Opcode::Double).with_float(*n)),
            Value::String(s) => Some(Instruction::new(Opcode::String).with_str(s.as_str())),
            Value::Boolean(b) => Some(Instruction::new(Opcode::Boolean).with_int(*b as i64)),
            Value::Array(_) => None,
        }
    }

    /// The value a constant-pushing instruction pushes.
    pub fn constant(&self) -> Option<Value> {
        match self.opcode {
            Opcode::Integer => self.int_operand.map(Value::Integer),
            Opcode::Double => self.float_operand.map(Value::Double),
            Opcode::String => self.str_operand.clone().map(Value::String),
            Opcode::Boolean => self.int_operand.map(|n| Value::Boolean(n != 0)),
            _ => None,
        }
    }

    /// The offset a resolved branch points at.
    pub fn target(&self) -> Option<Address> {
        if self.opcode.is_branch() && self.resolved {
            self.int_operand.map(|n| n as Address)
        } else {
            None
        }
    }

    pub fn set_target(&mut self, target: Address) {
        self.int_operand = Some(target as i64);
        self.resolved = true;
    }

    pub fn convert_type(&self) -> Option<ValueType> {
        match self.opcode {
            Opcode::Convert => self.int_operand.and_then(ValueType::from_code),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        self.str_operand.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.opcode)?;
        if let Some(n) = self.int_operand {
            match self.convert_type() {
                Some(t) => write!(f, " {}", t)?,
                None => write!(f, " {}", n)?,
            }
        } else if self.opcode.is_branch() {
            write!(f, " ?")?;
        }
        if let Some(n) = self.float_operand {
            write!(f, " {:?}", n)?;
        }
        if let Some(s) = &self.str_operand {
            match self.opcode {
                Opcode::String => write!(f, " \"{}\"", s)?,
                _ => write!(f, " {}", s)?,
            }
        }
        if !self.resolved {
            write!(f, " (unresolved)")?;
        }
        Ok(())
    }
}
