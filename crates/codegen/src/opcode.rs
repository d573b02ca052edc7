//! The NeoVM instruction set.
//!
//! Byte values and operand shapes follow the NeoVM opcode table. Every
//! opcode carries a static operand specification used to validate
//! instruction construction and raw annotation bytes.

use sha2::{Digest, Sha256};

/// Shape of an opcode's operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSpec {
    /// No operand bytes.
    None,
    /// Exactly this many operand bytes.
    Fixed(usize),
    /// A little-endian length prefix of this many bytes, followed by that
    /// many data bytes.
    Prefixed(usize),
}

use OperandSpec::{Fixed as F, Prefixed as P};
const NONE: OperandSpec = OperandSpec::None;

macro_rules! opcodes {
    ($($name:ident = $byte:literal => $spec:expr;)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $byte,)*
        }

        impl Opcode {
            pub const fn byte(self) -> u8 {
                self as u8
            }

            pub const fn operand_spec(self) -> OperandSpec {
                match self {
                    $(Opcode::$name => $spec,)*
                }
            }

            /// Looks up an opcode from its raw byte (annotation validation).
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    PushInt8 = 0x00 => F(1);
    PushInt16 = 0x01 => F(2);
    PushInt32 = 0x02 => F(4);
    PushInt64 = 0x03 => F(8);
    PushInt128 = 0x04 => F(16);
    PushInt256 = 0x05 => F(32);
    PushT = 0x08 => NONE;
    PushF = 0x09 => NONE;
    PushA = 0x0A => F(4);
    PushNull = 0x0B => NONE;
    PushData1 = 0x0C => P(1);
    PushData2 = 0x0D => P(2);
    PushData4 = 0x0E => P(4);
    PushM1 = 0x0F => NONE;
    Push0 = 0x10 => NONE;
    Push1 = 0x11 => NONE;
    Push2 = 0x12 => NONE;
    Push3 = 0x13 => NONE;
    Push4 = 0x14 => NONE;
    Push5 = 0x15 => NONE;
    Push6 = 0x16 => NONE;
    Push7 = 0x17 => NONE;
    Push8 = 0x18 => NONE;
    Push9 = 0x19 => NONE;
    Push10 = 0x1A => NONE;
    Push11 = 0x1B => NONE;
    Push12 = 0x1C => NONE;
    Push13 = 0x1D => NONE;
    Push14 = 0x1E => NONE;
    Push15 = 0x1F => NONE;
    Push16 = 0x20 => NONE;
    Nop = 0x21 => NONE;
    Jmp = 0x22 => F(1);
    JmpL = 0x23 => F(4);
    JmpIf = 0x24 => F(1);
    JmpIfL = 0x25 => F(4);
    JmpIfNot = 0x26 => F(1);
    JmpIfNotL = 0x27 => F(4);
    JmpEq = 0x28 => F(1);
    JmpEqL = 0x29 => F(4);
    JmpNe = 0x2A => F(1);
    JmpNeL = 0x2B => F(4);
    JmpGt = 0x2C => F(1);
    JmpGtL = 0x2D => F(4);
    JmpGe = 0x2E => F(1);
    JmpGeL = 0x2F => F(4);
    JmpLt = 0x30 => F(1);
    JmpLtL = 0x31 => F(4);
    JmpLe = 0x32 => F(1);
    JmpLeL = 0x33 => F(4);
    Call = 0x34 => F(1);
    CallL = 0x35 => F(4);
    CallA = 0x36 => NONE;
    CallT = 0x37 => F(2);
    Abort = 0x38 => NONE;
    Assert = 0x39 => NONE;
    Throw = 0x3A => NONE;
    Try = 0x3B => F(2);
    TryL = 0x3C => F(8);
    EndTry = 0x3D => F(1);
    EndTryL = 0x3E => F(4);
    EndFinally = 0x3F => NONE;
    Ret = 0x40 => NONE;
    Syscall = 0x41 => F(4);
    Depth = 0x43 => NONE;
    Drop = 0x45 => NONE;
    Nip = 0x46 => NONE;
    XDrop = 0x48 => NONE;
    Clear = 0x49 => NONE;
    Dup = 0x4A => NONE;
    Over = 0x4B => NONE;
    Pick = 0x4D => NONE;
    Tuck = 0x4E => NONE;
    Swap = 0x50 => NONE;
    Rot = 0x51 => NONE;
    Roll = 0x52 => NONE;
    Reverse3 = 0x53 => NONE;
    Reverse4 = 0x54 => NONE;
    ReverseN = 0x55 => NONE;
    InitSSlot = 0x56 => F(1);
    InitSlot = 0x57 => F(2);
    LdSFld0 = 0x58 => NONE;
    LdSFld1 = 0x59 => NONE;
    LdSFld2 = 0x5A => NONE;
    LdSFld3 = 0x5B => NONE;
    LdSFld4 = 0x5C => NONE;
    LdSFld5 = 0x5D => NONE;
    LdSFld6 = 0x5E => NONE;
    LdSFld = 0x5F => F(1);
    StSFld0 = 0x60 => NONE;
    StSFld1 = 0x61 => NONE;
    StSFld2 = 0x62 => NONE;
    StSFld3 = 0x63 => NONE;
    StSFld4 = 0x64 => NONE;
    StSFld5 = 0x65 => NONE;
    StSFld6 = 0x66 => NONE;
    StSFld = 0x67 => F(1);
    LdLoc0 = 0x68 => NONE;
    LdLoc1 = 0x69 => NONE;
    LdLoc2 = 0x6A => NONE;
    LdLoc3 = 0x6B => NONE;
    LdLoc4 = 0x6C => NONE;
    LdLoc5 = 0x6D => NONE;
    LdLoc6 = 0x6E => NONE;
    LdLoc = 0x6F => F(1);
    StLoc0 = 0x70 => NONE;
    StLoc1 = 0x71 => NONE;
    StLoc2 = 0x72 => NONE;
    StLoc3 = 0x73 => NONE;
    StLoc4 = 0x74 => NONE;
    StLoc5 = 0x75 => NONE;
    StLoc6 = 0x76 => NONE;
    StLoc = 0x77 => F(1);
    LdArg0 = 0x78 => NONE;
    LdArg1 = 0x79 => NONE;
    LdArg2 = 0x7A => NONE;
    LdArg3 = 0x7B => NONE;
    LdArg4 = 0x7C => NONE;
    LdArg5 = 0x7D => NONE;
    LdArg6 = 0x7E => NONE;
    LdArg = 0x7F => F(1);
    StArg0 = 0x80 => NONE;
    StArg1 = 0x81 => NONE;
    StArg2 = 0x82 => NONE;
    StArg3 = 0x83 => NONE;
    StArg4 = 0x84 => NONE;
    StArg5 = 0x85 => NONE;
    StArg6 = 0x86 => NONE;
    StArg = 0x87 => F(1);
    NewBuffer = 0x88 => NONE;
    Memcpy = 0x89 => NONE;
    Cat = 0x8B => NONE;
    Substr = 0x8C => NONE;
    Left = 0x8D => NONE;
    Right = 0x8E => NONE;
    Invert = 0x90 => NONE;
    And = 0x91 => NONE;
    Or = 0x92 => NONE;
    Xor = 0x93 => NONE;
    Equal = 0x97 => NONE;
    NotEqual = 0x98 => NONE;
    Sign = 0x99 => NONE;
    Abs = 0x9A => NONE;
    Negate = 0x9B => NONE;
    Inc = 0x9C => NONE;
    Dec = 0x9D => NONE;
    Add = 0x9E => NONE;
    Sub = 0x9F => NONE;
    Mul = 0xA0 => NONE;
    Div = 0xA1 => NONE;
    Mod = 0xA2 => NONE;
    Pow = 0xA3 => NONE;
    Sqrt = 0xA4 => NONE;
    Shl = 0xA8 => NONE;
    Shr = 0xA9 => NONE;
    Not = 0xAA => NONE;
    BoolAnd = 0xAB => NONE;
    BoolOr = 0xAC => NONE;
    Nz = 0xB1 => NONE;
    NumEqual = 0xB3 => NONE;
    NumNotEqual = 0xB4 => NONE;
    Lt = 0xB5 => NONE;
    Le = 0xB6 => NONE;
    Gt = 0xB7 => NONE;
    Ge = 0xB8 => NONE;
    Min = 0xB9 => NONE;
    Max = 0xBA => NONE;
    Within = 0xBB => NONE;
    PackMap = 0xBE => NONE;
    PackStruct = 0xBF => NONE;
    Pack = 0xC0 => NONE;
    Unpack = 0xC1 => NONE;
    NewArray0 = 0xC2 => NONE;
    NewArray = 0xC3 => NONE;
    NewArrayT = 0xC4 => F(1);
    NewStruct0 = 0xC5 => NONE;
    NewStruct = 0xC6 => NONE;
    NewMap = 0xC8 => NONE;
    Size = 0xCA => NONE;
    HasKey = 0xCB => NONE;
    Keys = 0xCC => NONE;
    Values = 0xCD => NONE;
    PickItem = 0xCE => NONE;
    Append = 0xCF => NONE;
    SetItem = 0xD0 => NONE;
    ReverseItems = 0xD1 => NONE;
    Remove = 0xD2 => NONE;
    ClearItems = 0xD3 => NONE;
    IsNull = 0xD8 => NONE;
    IsType = 0xD9 => F(1);
    Convert = 0xDB => F(1);
}

impl Opcode {
    /// The compact push opcode for small integers, when one exists.
    pub fn push_small_int(value: i64) -> Option<Opcode> {
        match value {
            -1 => Some(Opcode::PushM1),
            0 => Some(Opcode::Push0),
            1 => Some(Opcode::Push1),
            2 => Some(Opcode::Push2),
            3 => Some(Opcode::Push3),
            4 => Some(Opcode::Push4),
            5 => Some(Opcode::Push5),
            6 => Some(Opcode::Push6),
            7 => Some(Opcode::Push7),
            8 => Some(Opcode::Push8),
            9 => Some(Opcode::Push9),
            10 => Some(Opcode::Push10),
            11 => Some(Opcode::Push11),
            12 => Some(Opcode::Push12),
            13 => Some(Opcode::Push13),
            14 => Some(Opcode::Push14),
            15 => Some(Opcode::Push15),
            16 => Some(Opcode::Push16),
            _ => None,
        }
    }
}

/// The three variable slot spaces of an executing method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotFamily {
    Static,
    Local,
    Argument,
}

impl SlotFamily {
    const LOAD_COMPACT: [[Opcode; 7]; 3] = [
        [
            Opcode::LdSFld0,
            Opcode::LdSFld1,
            Opcode::LdSFld2,
            Opcode::LdSFld3,
            Opcode::LdSFld4,
            Opcode::LdSFld5,
            Opcode::LdSFld6,
        ],
        [
            Opcode::LdLoc0,
            Opcode::LdLoc1,
            Opcode::LdLoc2,
            Opcode::LdLoc3,
            Opcode::LdLoc4,
            Opcode::LdLoc5,
            Opcode::LdLoc6,
        ],
        [
            Opcode::LdArg0,
            Opcode::LdArg1,
            Opcode::LdArg2,
            Opcode::LdArg3,
            Opcode::LdArg4,
            Opcode::LdArg5,
            Opcode::LdArg6,
        ],
    ];
    const STORE_COMPACT: [[Opcode; 7]; 3] = [
        [
            Opcode::StSFld0,
            Opcode::StSFld1,
            Opcode::StSFld2,
            Opcode::StSFld3,
            Opcode::StSFld4,
            Opcode::StSFld5,
            Opcode::StSFld6,
        ],
        [
            Opcode::StLoc0,
            Opcode::StLoc1,
            Opcode::StLoc2,
            Opcode::StLoc3,
            Opcode::StLoc4,
            Opcode::StLoc5,
            Opcode::StLoc6,
        ],
        [
            Opcode::StArg0,
            Opcode::StArg1,
            Opcode::StArg2,
            Opcode::StArg3,
            Opcode::StArg4,
            Opcode::StArg5,
            Opcode::StArg6,
        ],
    ];

    const fn row(self) -> usize {
        match self {
            SlotFamily::Static => 0,
            SlotFamily::Local => 1,
            SlotFamily::Argument => 2,
        }
    }

    const fn wide_load(self) -> Opcode {
        match self {
            SlotFamily::Static => Opcode::LdSFld,
            SlotFamily::Local => Opcode::LdLoc,
            SlotFamily::Argument => Opcode::LdArg,
        }
    }

    const fn wide_store(self) -> Opcode {
        match self {
            SlotFamily::Static => Opcode::StSFld,
            SlotFamily::Local => Opcode::StLoc,
            SlotFamily::Argument => Opcode::StArg,
        }
    }

    /// Load opcode for slot `index`: the compact form for 0..=6, otherwise
    /// the one-byte-operand form.
    pub fn load_op(self, index: u8) -> (Opcode, Option<u8>) {
        if index <= 6 {
            (Self::LOAD_COMPACT[self.row()][index as usize], None)
        } else {
            (self.wide_load(), Some(index))
        }
    }

    pub fn store_op(self, index: u8) -> (Opcode, Option<u8>) {
        if index <= 6 {
            (Self::STORE_COMPACT[self.row()][index as usize], None)
        } else {
            (self.wide_store(), Some(index))
        }
    }
}

/// NeoVM stack item type codes (operands of ISTYPE/CONVERT/NEWARRAY_T).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StackItemType {
    Any = 0x00,
    Pointer = 0x10,
    Boolean = 0x20,
    Integer = 0x21,
    ByteString = 0x28,
    Buffer = 0x30,
    Array = 0x40,
    Struct = 0x41,
    Map = 0x48,
    InteropInterface = 0x60,
}

impl StackItemType {
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Interop services the compiler itself emits calls to.
pub mod interop {
    pub const RUNTIME_NOTIFY: &str = "System.Runtime.Notify";
}

/// The call hash of an interop service: the first four bytes of the SHA-256
/// digest of its name.
pub fn interop_hash(service: &str) -> [u8; 4] {
    let digest = Sha256::digest(service.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}
