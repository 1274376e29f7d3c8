//! The runtime type lattice.
//!
//! Two views of the same hierarchy live here:
//!
//! - [`Type`] is a closed sum type with an explicit ancestor table. Subtype
//!   checks ([`Type::is`]) walk the declared base types.
//! - [`TypeBits`] is the bit pattern a type tag carries on the wire and in
//!   `Type` values on the operand stack. Abstract markers (`VALUE`,
//!   `REFERENCE`, `NUMBER`) are OR-ed into the concrete leaves, so a leaf's
//!   pattern contains the markers of everything it descends from.
//!
//! The `TypeIs` opcode does not use the ancestor walk. It keeps the numeric
//! shortcut of the bytecode format, see [`TypeBits::numeric_is`].

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Bit pattern of a type tag.
    ///
    /// Arbitrary patterns are representable (decoded tags are retained
    /// verbatim); only the patterns produced by [`Type::bits`] name a type.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeBits: u32 {
        /// Set on the three abstract markers, cleared on every leaf.
        const ABSTRACT = 1 << 0;
        const VALUE = 1 << 1;
        const REFERENCE = 1 << 2;
        const NUMBER = 1 << 3;

        const TUPLE = 1 << 4;
        const LIST = 1 << 5;
        const STRING = 1 << 6;
        const EXPRESSION = 1 << 7;
        const TYPE = 1 << 8;
        const BOOLEAN = 1 << 9;
        const INTEGER = 1 << 10;
        const FLOAT = 1 << 11;
        const OPCODE = 1 << 12;
    }
}

impl TypeBits {
    /// The `TypeIs` rule: `(lhs & rhs) != 0 && lhs >= rhs`.
    ///
    /// This is an ordering shortcut over the raw patterns and disagrees with
    /// [`Type::is`] in places, e.g. `Integer` passes against `Boolean` here
    /// because both carry the `VALUE` marker and `Integer` has the larger
    /// pattern. Bytecode relies on the exact rule, so it is kept as is.
    #[inline]
    pub const fn numeric_is(self, rhs: TypeBits) -> bool {
        self.intersects(rhs) && self.bits() >= rhs.bits()
    }

    /// The named type carrying exactly this pattern, if any.
    #[inline]
    pub fn as_type(self) -> Option<Type> {
        Type::from_bits(self)
    }
}

/// A named point in the type lattice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// The zero tag. Also the type of the error sentinel value.
    Error,
    /// Abstract: inline, non-heap values.
    Value,
    /// Abstract: heap handles.
    Reference,
    /// Abstract: numeric values.
    Number,
    Tuple,
    List,
    String,
    Expression,
    Type,
    Boolean,
    Integer,
    Float,
    Opcode,
}

impl Type {
    /// Every named type, abstract markers included.
    pub const ALL: [Type; 13] = [
        Type::Error,
        Type::Value,
        Type::Reference,
        Type::Number,
        Type::Tuple,
        Type::List,
        Type::String,
        Type::Expression,
        Type::Type,
        Type::Boolean,
        Type::Integer,
        Type::Float,
        Type::Opcode,
    ];

    /// Direct base types, in declaration order.
    pub const fn bases(self) -> &'static [Type] {
        match self {
            Type::Error | Type::Value | Type::Reference | Type::Number => &[],
            Type::Tuple | Type::List | Type::String | Type::Expression => &[Type::Reference],
            Type::Type | Type::Boolean | Type::Opcode => &[Type::Value],
            Type::Integer | Type::Float => &[Type::Value, Type::Number],
        }
    }

    /// Subtype check: reflexive, then transitive through [`Type::bases`].
    pub fn is(self, other: Type) -> bool {
        self == other || self.bases().iter().any(|base| base.is(other))
    }

    /// Whether this is one of the abstract markers.
    #[inline]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Type::Value | Type::Reference | Type::Number)
    }

    /// Whether values of this type are heap handles.
    #[inline]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Type::Tuple | Type::List | Type::String | Type::Expression
        )
    }

    /// The tag's bit pattern.
    ///
    /// Abstract markers carry `ABSTRACT` plus their own bit. Leaves carry
    /// their own bit plus the (non-abstract) bits of every ancestor.
    pub const fn bits(self) -> TypeBits {
        let marker = match self {
            Type::Error => return TypeBits::empty(),
            Type::Value => return TypeBits::ABSTRACT.union(TypeBits::VALUE),
            Type::Reference => return TypeBits::ABSTRACT.union(TypeBits::REFERENCE),
            Type::Number => return TypeBits::ABSTRACT.union(TypeBits::NUMBER),
            Type::Tuple => TypeBits::TUPLE,
            Type::List => TypeBits::LIST,
            Type::String => TypeBits::STRING,
            Type::Expression => TypeBits::EXPRESSION,
            Type::Type => TypeBits::TYPE,
            Type::Boolean => TypeBits::BOOLEAN,
            Type::Integer => TypeBits::INTEGER,
            Type::Float => TypeBits::FLOAT,
            Type::Opcode => TypeBits::OPCODE,
        };
        match self {
            Type::Integer | Type::Float => {
                marker.union(TypeBits::VALUE).union(TypeBits::NUMBER)
            }
            Type::Type | Type::Boolean | Type::Opcode => marker.union(TypeBits::VALUE),
            _ => marker.union(TypeBits::REFERENCE),
        }
    }

    /// Reverse of [`Type::bits`].
    pub fn from_bits(bits: TypeBits) -> Option<Type> {
        Type::ALL.into_iter().find(|ty| ty.bits() == bits)
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Type::Error => "Error",
            Type::Value => "Value",
            Type::Reference => "Reference",
            Type::Number => "Number",
            Type::Tuple => "Tuple",
            Type::List => "List",
            Type::String => "String",
            Type::Expression => "Expression",
            Type::Type => "Type",
            Type::Boolean => "Boolean",
            Type::Integer => "Integer",
            Type::Float => "Float",
            Type::Opcode => "Opcode",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TypeBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_type() {
            Some(ty) => f.write_str(ty.name()),
            None => write!(f, "0x{:08X}", self.bits()),
        }
    }
}

impl From<Type> for TypeBits {
    #[inline]
    fn from(ty: Type) -> Self {
        ty.bits()
    }
}
