/// ## Virtual machine instruction set
///
/// The BASIC virtual machine has no registers.
/// Every operation is performed on the stack.
///
/// For example: `LET A=3*B` compiles to `[INTEGER 3, LOAD B, MUL, STORE A]`
///
/// Operands live on the `Instruction`, not in the opcode. Branch opcodes
/// carry their target in the integer operand; until the linker or a
/// backpatch fills it in the instruction is unresolved.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push the integer operand.
    Integer,
    /// Push the float operand.
    Double,
    /// Push the string operand.
    String,
    /// Push the integer operand as a boolean.
    Boolean,
    /// Push the value of the named variable. Signals UNKVAR if undefined.
    Load,
    /// Pop into the named variable in the local table.
    Store,
    StoreGlobal,
    StoreParent,
    StoreCommon,
    StoreConstant,
    Dup,
    Drop,
    /// Pop `n` values and push them as an array.
    Array,
    /// Pop index and array, push the element.
    Index,
    /// Convert top of stack to the `ValueType` code in the integer operand.
    Convert,
    Nop,

    // *** Expression operations
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Built-in function or `FUNCTION` program; name and argument count.
    CallFn,

    // *** Branch control
    Branch,
    BranchFalse,
    BranchTrue,
    /// Push a GOSUB frame and branch.
    Gosub,
    /// Pop a frame, discarding any value.
    Return,
    /// Pop a value and a frame, delivering the value to the caller.
    ReturnValue,
    /// Return from the current program.
    End,
    /// Halt the thread.
    Stop,

    // *** Loops
    /// Loop openers. The integer operand is the offset just past the
    /// matching closer.
    Do,
    For,
    ForEach,
    /// Loop closers. The integer operand is the opener's offset.
    Loop,
    Next,
    ExitLoop,
    ContinueLoop,
    /// Pop a condition and leave the innermost loop when it is false/true.
    ExitFalse,
    ExitTrue,

    // *** Signals
    /// Pop a signal name; register a handler at the integer operand.
    OnErrorGoto,
    OnErrorGosub,
    /// Raise the named signal; integer operand 1 when a value is on the stack.
    Signal,

    // *** Programs and threads
    Call,
    CallValue,
    CallThread,
    Execute,
    ExecuteThread,
    Chain,
    Lock,
    Unlock,
    Sleep,
    KillThread,
    ClearThreads,

    // *** Console and files
    Print,
    Input,
    OpenFile,
    CloseFile,
    PrintFile,
    ReadLine,
}

impl Opcode {
    /// Instructions whose integer operand is a code offset.
    pub fn is_branch(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Branch
                | BranchFalse
                | BranchTrue
                | Gosub
                | OnErrorGoto
                | OnErrorGosub
                | Do
                | For
                | ForEach
                | Loop
                | Next
        )
    }

    pub fn is_loop_opener(self) -> bool {
        matches!(self, Opcode::Do | Opcode::For | Opcode::ForEach)
    }

    pub fn is_loop_closer(self) -> bool {
        matches!(self, Opcode::Loop | Opcode::Next)
    }

    /// Whether `closer` is the closer this opener pairs with.
    pub fn closes(self, closer: Opcode) -> bool {
        matches!(
            (self, closer),
            (Opcode::Do, Opcode::Loop) | (Opcode::For, Opcode::Next) | (Opcode::ForEach, Opcode::Next)
        )
    }

    /// Instructions that push a constant and have no other effect.
    pub fn is_constant(self) -> bool {
        matches!(
            self,
            Opcode::Integer | Opcode::Double | Opcode::String | Opcode::Boolean
        )
    }

    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Integer => "INTEGER",
            Double => "DOUBLE",
            String => "STRING",
            Boolean => "BOOLEAN",
            Load => "LOAD",
            Store => "STORE",
            StoreGlobal => "STOREGLOBAL",
            StoreParent => "STOREPARENT",
            StoreCommon => "STORECOMMON",
            StoreConstant => "STORECONSTANT",
            Dup => "DUP",
            Drop => "DROP",
            Array => "ARRAY",
            Index => "INDEX",
            Convert => "CONVERT",
            Nop => "NOP",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Pow => "POW",
            Neg => "NEG",
            Not => "NOT",
            Eq => "EQ",
            Ne => "NE",
            Lt => "LT",
            Le => "LE",
            Gt => "GT",
            Ge => "GE",
            CallFn => "CALLFN",
            Branch => "BRANCH",
            BranchFalse => "BRFALSE",
            BranchTrue => "BRTRUE",
            Gosub => "GOSUB",
            Return => "RETURN",
            ReturnValue => "RETVAL",
            End => "END",
            Stop => "STOP",
            Do => "DO",
            For => "FOR",
            ForEach => "FOREACH",
            Loop => "LOOP",
            Next => "NEXT",
            ExitLoop => "EXITLOOP",
            ContinueLoop => "CONTLOOP",
            ExitFalse => "EXITFALSE",
            ExitTrue => "EXITTRUE",
            OnErrorGoto => "ONGOTO",
            OnErrorGosub => "ONGOSUB",
            Signal => "SIGNAL",
            Call => "CALL",
            CallValue => "CALLVAL",
            CallThread => "CALLTHREAD",
            Execute => "EXECUTE",
            ExecuteThread => "EXECTHREAD",
            Chain => "CHAIN",
            Lock => "LOCK",
            Unlock => "UNLOCK",
            Sleep => "SLEEP",
            KillThread => "KILLTHREAD",
            ClearThreads => "CLEARTHREADS",
            Print => "PRINT",
            Input => "INPUT",
            OpenFile => "OPEN",
            CloseFile => "CLOSE",
            PrintFile => "PRINTFILE",
            ReadLine => "READLINE",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
