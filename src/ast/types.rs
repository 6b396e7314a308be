use std::fmt::Display;

/// Kind tag of a semantic type.
///
/// The function kind carries its return type, so a return type exists if and
/// only if the kind is `Function`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
    Struct(String),
    Function(Box<TavType>),
    Void,
    Any,
}

/// A semantic type: a kind plus the number of pointer levels wrapped around it.
#[derive(Debug, Clone, PartialEq)]
pub struct TavType {
    pub kind: TypeKind,
    pub indirection: u8,
}

impl TavType {
    pub fn new(kind: TypeKind) -> Self {
        TavType {
            kind,
            indirection: 0,
        }
    }

    pub fn pointer(kind: TypeKind, indirection: u8) -> Self {
        TavType { kind, indirection }
    }

    pub fn structure(name: &str) -> Self {
        TavType::new(TypeKind::Struct(name.to_string()))
    }

    pub fn function(return_type: TavType) -> Self {
        TavType::new(TypeKind::Function(Box::new(return_type)))
    }

    pub fn void() -> Self {
        TavType::new(TypeKind::Void)
    }

    pub fn return_type(&self) -> Option<&TavType> {
        match &self.kind {
            TypeKind::Function(return_type) => Some(return_type),
            _ => None,
        }
    }

    /// Returns a copy with the indirection moved by `delta`, or `None` if it
    /// would leave the `0..=255` range.
    pub fn with_indirection(&self, delta: i16) -> Option<TavType> {
        let indirection = u8::try_from(self.indirection as i16 + delta).ok()?;
        Some(TavType {
            kind: self.kind.clone(),
            indirection,
        })
    }

    pub fn is_int(&self) -> bool {
        self.indirection == 0
            && matches!(
                self.kind,
                TypeKind::I8 | TypeKind::I16 | TypeKind::I32 | TypeKind::I64
            )
    }

    pub fn is_float(&self) -> bool {
        self.indirection == 0 && matches!(self.kind, TypeKind::F32 | TypeKind::F64)
    }

    pub fn is_bool(&self) -> bool {
        self.indirection == 0 && self.kind == TypeKind::Bool
    }

    pub fn is_numeric(&self) -> bool {
        self.is_int() || self.is_float()
    }

    pub fn is_pointer(&self) -> bool {
        self.indirection > 0
    }

    pub fn is_void(&self) -> bool {
        self.indirection == 0 && matches!(self.kind, TypeKind::Void)
    }

    /// Struct values are lowered as the address of their storage.
    pub fn is_aggregate(&self) -> bool {
        self.indirection == 0 && matches!(self.kind, TypeKind::Struct(_))
    }

    /// Bit width of integer, float and bool kinds.
    pub fn bit_width(&self) -> Option<u32> {
        if self.indirection > 0 {
            return None;
        }
        match self.kind {
            TypeKind::Bool => Some(1),
            TypeKind::I8 => Some(8),
            TypeKind::I16 => Some(16),
            TypeKind::I32 | TypeKind::F32 => Some(32),
            TypeKind::I64 | TypeKind::F64 => Some(64),
            _ => None,
        }
    }
}

impl Display for TavType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for _ in 0..self.indirection {
            write!(f, "*")?;
        }
        match &self.kind {
            TypeKind::I8 => write!(f, "i8"),
            TypeKind::I16 => write!(f, "i16"),
            TypeKind::I32 => write!(f, "i32"),
            TypeKind::I64 => write!(f, "i64"),
            TypeKind::F32 => write!(f, "f32"),
            TypeKind::F64 => write!(f, "f64"),
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::String => write!(f, "string"),
            TypeKind::Struct(name) => write!(f, "{}", name),
            TypeKind::Function(return_type) => write!(f, "fn() -> {}", return_type),
            TypeKind::Void => write!(f, "void"),
            TypeKind::Any => write!(f, "any"),
        }
    }
}

/// The payload of a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TavValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl TavValue {
    /// Whether this payload is the one a literal of `tav_type` carries.
    pub fn matches(&self, tav_type: &TavType) -> bool {
        if tav_type.indirection > 0 {
            return false;
        }
        match self {
            TavValue::Int(_) => tav_type.is_int(),
            TavValue::Float(_) => tav_type.is_float(),
            TavValue::String(_) => tav_type.kind == TypeKind::String,
            TavValue::Bool(_) => tav_type.kind == TypeKind::Bool,
        }
    }
}

impl Display for TavValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TavValue::Int(value) => write!(f, "{}", value),
            TavValue::Float(value) => write!(f, "{}", value),
            TavValue::String(value) => write!(f, "{:?}", value),
            TavValue::Bool(value) => write!(f, "{}", value),
        }
    }
}
